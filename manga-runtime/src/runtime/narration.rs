//! 视角变化与朗读

use tracing::debug;

use crate::command::Command;
use crate::runtime::MangaRuntime;

impl MangaRuntime {
    /// 更新相机朝向
    pub fn set_orientation(&mut self, pitch: f64, yaw: f64) {
        self.view.pitch = pitch;
        self.view.yaw = yaw;
        self.commands.push(Command::ViewChanged { pitch, yaw });
        self.narrate();
    }

    /// 切换图层可见性键
    pub fn set_layer_key(&mut self, key: &str) {
        self.view.key = key.to_string();
        self.commands.push(Command::LayerVisibilityChanged {
            key: key.to_string(),
        });
        self.narrate();
    }

    /// 取出布局变化后需要重新朗读的文本
    ///
    /// 说明框布局和气泡布局各自与上次朗读时比较，只有变化的那一类会被重读。
    /// 两类都没变时返回空列表。
    pub fn read_new_text(&mut self) -> Vec<String> {
        let Some(page) = self.book.current_page() else {
            return Vec::new();
        };
        let eval = self.conditions();
        let caption_layout = page.captions.layout(&self.view, &eval);
        let balloon_layout = page.balloons.layout(&self.view, &eval);

        let mut lines = Vec::new();
        if self.read_captions.as_deref() != Some(caption_layout.as_str()) {
            lines.extend(
                page.captions
                    .visible(&self.view, &eval)
                    .into_iter()
                    .map(|(_, caption)| self.engine.expand_macros(&caption.text, &self.book)),
            );
        }
        if self.read_balloons.as_deref() != Some(balloon_layout.as_str()) {
            lines.extend(
                page.balloons
                    .visible(&self.view, &eval)
                    .into_iter()
                    .map(|(_, balloon)| {
                        let text = self.engine.expand_macros(&balloon.text, &self.book);
                        if balloon.speaker.is_empty() {
                            text
                        } else {
                            format!("{}: {text}", balloon.speaker)
                        }
                    }),
            );
        }
        lines.retain(|line| !line.trim().is_empty());

        self.read_captions = Some(caption_layout);
        self.read_balloons = Some(balloon_layout);
        lines
    }

    /// 朗读当前页所有可见文本（不论布局是否变化）
    pub fn read_aloud(&mut self) {
        self.read_captions = None;
        self.read_balloons = None;
        let lines = self.read_new_text();
        if !lines.is_empty() {
            self.commands.push(Command::ReadAloud { lines });
        }
    }

    /// 开启自动朗读时，布局变化后朗读新文本
    pub(crate) fn narrate(&mut self) {
        if !self.config.auto_read_aloud {
            return;
        }
        let lines = self.read_new_text();
        if lines.is_empty() {
            debug!("布局未变化，无需朗读");
        } else {
            self.commands.push(Command::ReadAloud { lines });
        }
    }
}
