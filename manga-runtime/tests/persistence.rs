mod common;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use common::{RecordingLoader, ScriptedEngine};
use manga_runtime::{
    ArgType, BindingError, BindingScope, Book, Caption, Chapter, ContentGraph, DiagnosticLevel, Interaction,
    InventoryItem, ItemStatus, MangaRuntime, Page, PageSource, PageSourcing, Placement,
    ResourceTags, SaveBlob, SaveError, SaveVersion, ScriptValue, Visibility, analyze_book,
};

fn story() -> Book {
    let mut p1 = Page::new("p1");
    p1.next_page_id = "p2".to_string();
    p1.captions
        .insert(Placement::Header, Caption::new("第一夜", Visibility::always()));
    let mut book = Book::in_memory(vec![
        Chapter::new("intro").with_page(p1).with_page(Page::new("p2")),
        Chapter::new("mid").with_page(Page::new("p3")),
    ]);
    book.inventory.add(InventoryItem {
        title: "油灯".to_string(),
        ..InventoryItem::new("lamp")
    });
    book
}

#[test]
fn test_full_save_restores_into_empty_runtime() {
    let mut runtime = MangaRuntime::new(story());
    runtime.display_page("intro|p1").unwrap();
    runtime.next_page().unwrap();
    runtime.book_mut().state.set_int("visits", 3);
    runtime.discover_note("diary");
    runtime.take_item("lamp");
    let blob = runtime.save();

    let mut restored = MangaRuntime::new(Book::default());
    restored.load(&blob).unwrap();

    let book = restored.book();
    assert!(book.started_reading);
    assert_eq!(book.current_page_id, "intro|p2");
    assert_eq!(book.last_page_id, "intro|p1");
    assert_eq!(book.state.get_int("visits"), 3);
    assert!(book.notebook.get("diary").unwrap().discovered);
    let lamp = book.inventory.get_item("lamp").unwrap();
    assert_eq!(lamp.status, ItemStatus::Carried);
    assert_eq!(lamp.title, "油灯");
    assert_eq!(book.graph.chapter_ids(), vec!["intro", "mid"]);
    assert_eq!(book.graph.pinned(), Some("intro"));

    let caption = book
        .peek_page("intro|p1")
        .and_then(|p| p.captions.get(Placement::Header))
        .map(|c| c.text.clone());
    assert_eq!(caption.as_deref(), Some("第一夜"));

    restored.display_page("@last").unwrap();
    assert_eq!(restored.book().current_page_id, "intro|p1");
}

#[test]
fn test_state_only_save_merges_over_definitions() {
    let mut runtime = MangaRuntime::new(story());
    runtime.display_page("intro|p1").unwrap();
    runtime.take_item("lamp");
    runtime.book_mut().state.set_bool("door.open", true);
    let blob = runtime.save_state_only();

    runtime.display_page("mid|p3").unwrap();
    runtime.drop_item("lamp");
    runtime.book_mut().state.set_bool("door.open", false);

    runtime.load(&blob).unwrap();

    let book = runtime.book();
    assert_eq!(book.current_page_id, "intro|p1");
    assert!(book.state.get_bool("door.open"));
    let lamp = book.inventory.get_item("lamp").unwrap();
    assert_eq!(lamp.status, ItemStatus::Carried);
    assert!(lamp.page_id.is_empty());
    assert_eq!(lamp.title, "油灯");
    assert_eq!(book.graph.chapter_ids(), vec!["intro", "mid"]);
}

#[test]
fn test_state_only_blob_carries_no_chapters() {
    let mut runtime = MangaRuntime::new(story());
    runtime.display_page("intro|p1").unwrap();

    let blob = SaveBlob::parse(&runtime.save_state_only()).unwrap();
    assert!(blob.state_only);
    assert!(blob.chapters.is_empty());

    let full = SaveBlob::parse(&runtime.save()).unwrap();
    assert!(!full.state_only);
    assert_eq!(full.chapters.len(), 2);
}

#[test]
fn test_incompatible_version_leaves_book_untouched() {
    let mut runtime = MangaRuntime::new(story());
    runtime.display_page("intro|p1").unwrap();

    let blob = SaveBlob {
        version: SaveVersion { major: 2, minor: 0 },
        current_page_id: "mid|p3".to_string(),
        ..Default::default()
    }
    .encode();

    let err = runtime.load(&blob).unwrap_err();
    assert!(matches!(err, SaveError::IncompatibleVersion { .. }));
    assert_eq!(runtime.book().current_page_id, "intro|p1");
    assert_eq!(runtime.book().graph.chapter_ids(), vec!["intro", "mid"]);
}

#[test]
fn test_newer_minor_version_is_accepted() {
    let mut runtime = MangaRuntime::new(story());
    let blob = SaveBlob {
        version: SaveVersion {
            major: SaveVersion::current().major,
            minor: 9,
        },
        state_only: true,
        current_page_id: "mid|p3".to_string(),
        ..Default::default()
    }
    .encode();

    runtime.load(&blob).unwrap();
    assert_eq!(runtime.book().current_page_id, "mid|p3");
}

#[test]
fn test_load_cancels_pending_display() {
    let mut tagged = Page::new("p1");
    tagged.tags = ResourceTags {
        load: "bundle".to_string(),
        ..Default::default()
    };
    let loader = RecordingLoader::new();
    let mut runtime =
        MangaRuntime::new(Book::in_memory(vec![Chapter::new("c").with_page(tagged)]))
            .with_loader(loader.clone());
    let blob = runtime.save();

    runtime.display_page("c|p1").unwrap();
    assert!(runtime.pending_ticket().is_some());

    runtime.load(&blob).unwrap();
    assert_eq!(runtime.pending_ticket(), None);
    runtime.drain_commands();

    let ticket = loader.last_ticket().unwrap();
    runtime.resource_event(ticket, manga_runtime::ResourceEvent::Succeeded);
    assert!(runtime.drain_commands().is_empty());
}

#[test]
fn test_dual_addressing() {
    let mut book = story();

    let bare = book.get_page("p3").map(Page::full_id);
    let qualified = book.get_page("mid|p3").map(Page::full_id);
    assert_eq!(bare.as_deref(), Some("mid|p3"));
    assert_eq!(bare, qualified);

    assert!(book.get_page("intro|p3").is_none());
    assert!(book.peek_page(" mid|p3 ").is_some());
}

fn jit_book(built: Rc<RefCell<Vec<String>>>) -> Book {
    let builder = move |id: &str| -> Option<Chapter> {
        built.borrow_mut().push(id.to_string());
        let chapter = Chapter::new(id).purgable(true);
        Some(chapter.with_page(Page::new("p")))
    };
    Book::new(ContentGraph::just_in_time(builder))
}

#[test]
fn test_jit_build_keeps_pinned_chapter() {
    let built = Rc::new(RefCell::new(Vec::new()));
    let mut runtime = MangaRuntime::new(jit_book(built.clone()));

    runtime.display_page("a|p").unwrap();
    // 只查询不切页：固定的 a 不会被回收
    assert!(runtime.book_mut().get_page("b|p").is_some());
    assert_eq!(runtime.book().graph.chapter_ids(), vec!["a", "b"]);

    // c 构建前回收 b，a 仍被固定
    assert!(runtime.book_mut().get_page("c|p").is_some());
    assert_eq!(runtime.book().graph.chapter_ids(), vec!["a", "c"]);

    runtime.display_page("c|p").unwrap();
    assert_eq!(runtime.book().graph.chapter_ids(), vec!["c"]);
    assert_eq!(*built.borrow(), vec!["a", "b", "c"]);

    // 被回收的章节再次访问时重新构建
    runtime.display_page("a|p").unwrap();
    assert_eq!(built.borrow().len(), 4);
}

#[test]
fn test_jit_save_round_trip_keeps_builder() {
    let built = Rc::new(RefCell::new(Vec::new()));
    let mut runtime = MangaRuntime::new(jit_book(built.clone()));
    runtime.display_page("a|p").unwrap();
    let blob = runtime.save();

    runtime.load(&blob).unwrap();
    assert_eq!(runtime.book().sourcing(), PageSourcing::JustInTime);
    runtime.display_page("z|p").unwrap();
    assert_eq!(runtime.book().current_page_id, "z|p");
    assert_eq!(*built.borrow(), vec!["a", "z"]);
}

/// 按章节分组的外部页面来源
#[derive(Default)]
struct MapSource {
    pages: HashMap<String, Vec<Page>>,
    calls: Rc<RefCell<usize>>,
}

impl MapSource {
    fn with(mut self, chapter: &str, page: &str) -> Self {
        let mut p = Page::new(page);
        p.chapter_id = chapter.to_string();
        self.pages.entry(chapter.to_string()).or_default().push(p);
        self
    }
}

impl PageSource for MapSource {
    fn page(&mut self, chapter_id: Option<&str>, page_id: &str) -> Option<Page> {
        *self.calls.borrow_mut() += 1;
        self.pages
            .iter()
            .filter(|(chapter, _)| chapter_id.is_none_or(|c| c == chapter.as_str()))
            .flat_map(|(_, pages)| pages)
            .find(|p| p.id == page_id)
            .cloned()
    }

    fn chapter(&mut self, chapter_id: &str) -> Option<Chapter> {
        let pages = self.pages.get(chapter_id)?;
        let mut chapter = Chapter::new(chapter_id);
        for page in pages {
            chapter.insert_page(page.clone());
        }
        Some(chapter)
    }
}

#[test]
fn test_external_pages_are_fetched_and_released() {
    let calls = Rc::new(RefCell::new(0));
    let source = MapSource {
        calls: calls.clone(),
        ..Default::default()
    }
    .with("x", "a")
    .with("y", "b");
    let mut runtime = MangaRuntime::new(Book::new(ContentGraph::external(source)));

    runtime.display_page("x|a").unwrap();
    assert!(runtime.book().peek_page("x|a").is_some());
    runtime.display_page("x|a").unwrap();
    assert_eq!(*calls.borrow(), 1);

    runtime.display_page("y|b").unwrap();
    assert!(runtime.book().peek_page("x|a").is_none());
    assert!(runtime.book().peek_page("y|b").is_some());
    assert_eq!(runtime.book().last_page_id, "x|a");

    assert!(runtime.display_page("y|missing").is_err());
    assert_eq!(runtime.book().current_page_id, "y|b");
}

#[test]
fn test_diagnostics_on_loaded_book() {
    let mut broken = Page::new("p2");
    broken.next_page_id = "nowhere".to_string();
    let mut book = story();
    book.graph.insert_page("intro", broken);
    book.inventory.add(InventoryItem {
        status: ItemStatus::Hidden,
        page_id: "intro|gone".to_string(),
        ..InventoryItem::new("key")
    });

    let mut runtime = MangaRuntime::new(Book::default());
    runtime.load(&MangaRuntime::new(book).save()).unwrap();

    let result = analyze_book(runtime.book());
    assert!(result.has_errors());
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.warn_count(), 1);
    let error = &result.filter_by_level(DiagnosticLevel::Error)[0];
    assert_eq!(error.location, "intro|p2");
    assert!(error.message.contains("nowhere"));
}

fn greet(scope: &mut BindingScope<'_>, args: &[ScriptValue]) -> ScriptValue {
    let name = args.first().map(ToString::to_string).unwrap_or_default();
    scope.book.state.set_string("greeted", name);
    ScriptValue::Unit
}

#[test]
fn test_custom_binding_validation() {
    let mut page = Page::new("start");
    page.interactions.push(Interaction::new("bad", Visibility::key("bad"), "greet"));
    page.interactions.push(Interaction::new("typo", Visibility::key("typo"), "greet 5"));
    page.interactions.push(Interaction::new("ok", Visibility::key("ok"), "greet 旅人"));
    let mut runtime = MangaRuntime::new(Book::in_memory(vec![Chapter::new("c").with_page(page)]))
        .with_engine(ScriptedEngine::new());
    runtime.display_page("c|start").unwrap();

    runtime
        .bindings_mut()
        .register("greet", vec![ArgType::String], ArgType::Unit, greet)
        .unwrap();
    assert_eq!(
        runtime
            .bindings_mut()
            .register("greet", vec![], ArgType::Unit, greet),
        Err(BindingError::Duplicate {
            name: "greet".to_string()
        })
    );
    assert!(matches!(
        runtime
            .bindings_mut()
            .register("wide", vec![ArgType::Any; 5], ArgType::Unit, greet),
        Err(BindingError::TooManyParams { count: 5, .. })
    ));

    for key in ["bad", "typo"] {
        runtime.set_layer_key(key);
        assert!(runtime.trigger_interaction());
        assert_eq!(runtime.book().state.get_string("greeted"), "");
    }

    runtime.set_layer_key("ok");
    runtime.trigger_interaction();
    assert_eq!(runtime.book().state.get_string("greeted"), "旅人");
}
