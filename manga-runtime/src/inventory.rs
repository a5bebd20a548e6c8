//! # Inventory 模块
//!
//! 物品与其生命周期：
//!
//! ```text
//! Unassigned ──take──► Carried ──drop──► Dropped(page)
//!      │                  ▲                   │
//!      └──hide──► Hidden(page) ─take─┘◄──take─┘
//! ```
//!
//! 物品栏本身不接触脚本引擎：各操作返回需要执行的钩子脚本，
//! 由 [`MangaRuntime`](crate::MangaRuntime) 负责执行。
//!
//! 对未知 id 的操作一律静默忽略。脚本会乐观地探测物品，
//! 这里不能报错。

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{self, Code, Divider, FieldReader, FieldWriter, Record};
use crate::state::StateStore;

/// 物品状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    /// 尚未分配（奖励池）
    #[default]
    Unassigned,
    /// 玩家携带
    Carried,
    /// 藏在某页
    Hidden,
    /// 被丢在某页
    Dropped,
}

impl Code for ItemStatus {
    fn code(&self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Carried => "carried",
            Self::Hidden => "hidden",
            Self::Dropped => "dropped",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "unassigned" => Some(Self::Unassigned),
            "carried" => Some(Self::Carried),
            "hidden" => Some(Self::Hidden),
            "dropped" => Some(Self::Dropped),
            _ => None,
        }
    }
}

/// 物品定义（含动态状态）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub status: ItemStatus,
    /// 藏匿 / 丢弃所在页，其余状态为空
    pub page_id: String,
    pub initial_quantity: i64,
    pub remaining_quantity: i64,
    pub on_acquire: String,
    pub on_lost: String,
    pub on_use: String,
}

impl InventoryItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// 设置数量（初始值与剩余值相同）
    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.initial_quantity = quantity;
        self.remaining_quantity = quantity;
        self
    }

    /// 动态状态视图
    pub fn state(&self) -> ItemState {
        ItemState {
            id: self.id.clone(),
            status: self.status,
            page_id: self.page_id.clone(),
            remaining_quantity: self.remaining_quantity,
        }
    }

    /// 只覆盖动态字段
    pub fn apply_state(&mut self, state: &ItemState) {
        self.status = state.status;
        self.page_id = state.page_id.clone();
        self.remaining_quantity = state.remaining_quantity;
    }
}

impl Record for InventoryItem {
    const DIVIDER: Divider = codec::ITEM;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.id)
            .text(&self.title)
            .text(&self.description)
            .str(&self.image)
            .code(&self.status)
            .str(&self.page_id)
            .int(self.initial_quantity)
            .int(self.remaining_quantity)
            .text(&self.on_acquire)
            .text(&self.on_lost)
            .text(&self.on_use);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            id: input.str(),
            title: input.text(),
            description: input.text(),
            image: input.str(),
            status: input.code(),
            page_id: input.str(),
            initial_quantity: input.int(),
            remaining_quantity: input.int(),
            on_acquire: input.text(),
            on_lost: input.text(),
            on_use: input.text(),
        }
    }
}

/// 物品的动态状态（轻量存档）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemState {
    pub id: String,
    pub status: ItemStatus,
    pub page_id: String,
    pub remaining_quantity: i64,
}

impl Record for ItemState {
    const DIVIDER: Divider = codec::ITEM_STATE;

    fn write(&self, out: &mut FieldWriter) {
        out.str(&self.id)
            .code(&self.status)
            .str(&self.page_id)
            .int(self.remaining_quantity);
    }

    fn read(input: &mut FieldReader<'_>) -> Self {
        Self {
            id: input.str(),
            status: input.code(),
            page_id: input.str(),
            remaining_quantity: input.int(),
        }
    }
}

/// 随机奖励取到的物品
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardDrop {
    pub item_id: String,
    /// 获得钩子，空脚本时为 `None`
    pub hook: Option<String>,
}

/// 物品栏
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

fn hook(script: &str) -> Option<String> {
    if script.trim().is_empty() {
        None
    } else {
        Some(script.to_string())
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    /// 加入物品，同 id 时替换定义
    pub fn add(&mut self, item: InventoryItem) {
        match self.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_item(&self, id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn get_item_mut(&mut self, id: &str) -> Option<&mut InventoryItem> {
        let item = self.items.iter_mut().find(|i| i.id == id);
        if item.is_none() {
            debug!(item_id = id, "未知物品，忽略");
        }
        item
    }

    /// 是否携带
    pub fn is_carried(&self, id: &str) -> bool {
        self.get_item(id)
            .is_some_and(|i| i.status == ItemStatus::Carried)
    }

    /// 物品是否藏在某页
    pub fn contains_hidden(&self, id: &str) -> bool {
        self.get_item(id)
            .is_some_and(|i| i.status == ItemStatus::Hidden)
    }

    /// 拾取：无论之前是什么状态都变为携带，清除所在页
    ///
    /// 返回获得钩子。
    pub fn take(&mut self, id: &str) -> Option<String> {
        let item = self.get_item_mut(id)?;
        item.status = ItemStatus::Carried;
        item.page_id.clear();
        hook(&item.on_acquire)
    }

    /// 丢弃到指定页，返回失去钩子
    pub fn drop_at(&mut self, id: &str, page_id: &str) -> Option<String> {
        let item = self.get_item_mut(id)?;
        item.status = ItemStatus::Dropped;
        item.page_id = page_id.to_string();
        hook(&item.on_lost)
    }

    /// 藏到指定页
    pub fn hide_at(&mut self, id: &str, page_id: &str) {
        if let Some(item) = self.get_item_mut(id) {
            item.status = ItemStatus::Hidden;
            item.page_id = page_id.to_string();
        }
    }

    /// 使用：只返回使用钩子，不改变状态也不消耗数量
    pub fn use_item(&self, id: &str) -> Option<String> {
        match self.get_item(id) {
            Some(item) => hook(&item.on_use),
            None => {
                debug!(item_id = id, "未知物品，忽略");
                None
            }
        }
    }

    /// 消耗数量，返回剩余值；不会低于 0
    pub fn consume(&mut self, id: &str, amount: i64) -> Option<i64> {
        let item = self.get_item_mut(id)?;
        item.remaining_quantity = item.remaining_quantity.saturating_sub(amount).max(0);
        Some(item.remaining_quantity)
    }

    /// 随机奖励
    ///
    /// 每次调用都把 `{page_id}{flag_suffix}` 标记为 `true`（幂等），
    /// 然后从未分配的物品中随机取一个。洗牌作用在下标副本上，
    /// 物品栏本身的顺序不变。奖励池耗尽时什么也不做。
    pub fn take_random_unassigned<R>(
        &mut self,
        page_id: &str,
        flag_suffix: &str,
        state: &mut StateStore,
        rng: &mut R,
    ) -> Option<RewardDrop>
    where
        R: Rng + ?Sized,
    {
        state.set_bool(format!("{page_id}{flag_suffix}"), true);

        let mut indices: Vec<usize> = (0..self.items.len()).collect();
        indices.shuffle(rng);
        let index = indices
            .into_iter()
            .find(|&i| self.items[i].status == ItemStatus::Unassigned)?;

        let item_id = self.items[index].id.clone();
        let hook = self.take(&item_id);
        Some(RewardDrop { item_id, hook })
    }

    /// 携带中的物品
    pub fn carried(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Carried)
    }

    /// 藏在或丢在某页的物品
    pub fn items_on_page<'a>(&'a self, page_id: &'a str) -> impl Iterator<Item = &'a InventoryItem> {
        self.items.iter().filter(move |i| {
            matches!(i.status, ItemStatus::Hidden | ItemStatus::Dropped) && i.page_id == page_id
        })
    }

    /// 轻量存档：只导出动态状态
    pub fn encode_state_only(&self) -> Vec<ItemState> {
        self.items.iter().map(InventoryItem::state).collect()
    }

    /// 把轻量存档合并到现有物品定义上
    ///
    /// 只更新 id 匹配的物品的状态 / 位置 / 剩余数量，
    /// 标题、描述、脚本保持不变。未知 id 忽略。
    pub fn merge_state_only(&mut self, states: &[ItemState]) {
        for state in states {
            match self.items.iter_mut().find(|i| i.id == state.id) {
                Some(item) => item.apply_state(state),
                None => debug!(item_id = %state.id, "轻量存档中的物品不存在，忽略"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn item(id: &str) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            title: format!("{id} title"),
            description: format!("{id} description"),
            on_acquire: format!("acquire({id})"),
            on_lost: format!("lost({id})"),
            on_use: format!("use({id})"),
            ..Default::default()
        }
        .with_quantity(3)
    }

    fn pool(ids: &[&str]) -> Inventory {
        Inventory::from_items(ids.iter().map(|id| item(id)).collect())
    }

    #[test]
    fn test_take_clears_location_regardless_of_status() {
        let mut inventory = pool(&["key"]);
        inventory.drop_at("key", "p1");
        assert_eq!(inventory.get_item("key").map(|i| i.status), Some(ItemStatus::Dropped));

        let hook = inventory.take("key");
        let key = inventory.get_item("key").unwrap();
        assert_eq!(key.status, ItemStatus::Carried);
        assert_eq!(key.page_id, "");
        assert_eq!(hook.as_deref(), Some("acquire(key)"));
    }

    #[test]
    fn test_drop_sets_page() {
        let mut inventory = pool(&["key"]);
        inventory.take("key");
        let hook = inventory.drop_at("key", "intro|p2");
        let key = inventory.get_item("key").unwrap();
        assert_eq!(key.status, ItemStatus::Dropped);
        assert_eq!(key.page_id, "intro|p2");
        assert_eq!(hook.as_deref(), Some("lost(key)"));
        assert_eq!(inventory.items_on_page("intro|p2").count(), 1);
    }

    #[test]
    fn test_use_does_not_change_state() {
        let mut inventory = pool(&["potion"]);
        inventory.take("potion");
        let before = inventory.get_item("potion").cloned();
        assert_eq!(inventory.use_item("potion").as_deref(), Some("use(potion)"));
        assert_eq!(inventory.get_item("potion").cloned(), before);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut inventory = pool(&["key"]);
        let before = inventory.clone();
        assert!(inventory.take("ghost").is_none());
        assert!(inventory.drop_at("ghost", "p").is_none());
        assert!(inventory.use_item("ghost").is_none());
        assert!(inventory.consume("ghost", 1).is_none());
        inventory.hide_at("ghost", "p");
        assert!(!inventory.contains_hidden("ghost"));
        assert_eq!(inventory, before);
    }

    #[test]
    fn test_empty_hook_is_none() {
        let mut inventory = Inventory::from_items(vec![InventoryItem::new("plain")]);
        assert!(inventory.take("plain").is_none());
        assert!(inventory.is_carried("plain"));
    }

    #[test]
    fn test_hidden_and_consume() {
        let mut inventory = pool(&["coin"]);
        inventory.hide_at("coin", "vault");
        assert!(inventory.contains_hidden("coin"));
        assert_eq!(inventory.consume("coin", 2), Some(1));
        assert_eq!(inventory.consume("coin", 5), Some(0));
    }

    #[test]
    fn test_random_reward_never_takes_assigned() {
        let mut inventory = pool(&["a", "b", "c"]);
        inventory.take("b");
        inventory.hide_at("c", "p0");
        let mut state = StateStore::new();
        let mut rng = StdRng::seed_from_u64(7);

        let drop = inventory
            .take_random_unassigned("p1", ".rewardTriggered", &mut state, &mut rng)
            .unwrap();
        assert_eq!(drop.item_id, "a");
        assert_eq!(drop.hook.as_deref(), Some("acquire(a)"));
        assert!(state.get_bool("p1.rewardTriggered"));

        // 奖励池耗尽
        for _ in 0..3 {
            let again = inventory.take_random_unassigned("p1", ".rewardTriggered", &mut state, &mut rng);
            assert!(again.is_none());
        }
        assert_eq!(inventory.get_item("c").map(|i| i.status), Some(ItemStatus::Hidden));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_random_reward_keeps_list_order() {
        let mut inventory = pool(&["a", "b", "c", "d"]);
        let mut state = StateStore::new();
        let mut rng = StdRng::seed_from_u64(42);
        inventory.take_random_unassigned("p", ".rewardTriggered", &mut state, &mut rng);

        let ids: Vec<_> = inventory.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(inventory.carried().count(), 1);
    }

    #[test]
    fn test_merge_state_only_keeps_definitions() {
        let mut saved = pool(&["a", "b"]);
        saved.take("a");
        saved.drop_at("b", "p9");
        saved.consume("b", 1);
        let states = saved.encode_state_only();

        let mut fresh = pool(&["a", "b", "c"]);
        fresh.merge_state_only(&states);
        fresh.merge_state_only(&[ItemState {
            id: "ghost".to_string(),
            ..Default::default()
        }]);

        let b = fresh.get_item("b").unwrap();
        assert_eq!(b.status, ItemStatus::Dropped);
        assert_eq!(b.page_id, "p9");
        assert_eq!(b.remaining_quantity, 2);
        assert_eq!(b.title, "b title");
        assert_eq!(b.on_use, "use(b)");
        assert_eq!(fresh.get_item("c").map(|i| i.status), Some(ItemStatus::Unassigned));
        assert_eq!(fresh.len(), 3);
    }

    #[test]
    fn test_item_round_trip() {
        let mut original = item("lamp");
        original.status = ItemStatus::Hidden;
        original.page_id = "attic|p1".to_string();
        original.image = "items/lamp.png".to_string();
        assert_eq!(decode::<InventoryItem>(&encode(&original)), original);

        let state = original.state();
        assert_eq!(decode::<ItemState>(&encode(&state)), state);
    }
}
