//! The displayed conversation, as opposed to the capped history window.
//!
//! Everything the user saw goes here, including comparisons and error
//! notices, so it can be exported or counted.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Speaker {
    User,
    Bot,
}

/// How a bot message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    Normal,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChatStats {
    pub user_messages: usize,
    pub bot_messages: usize,
    pub total_messages: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Speaker::User, MessageKind::Normal, text.into());
    }

    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.push(Speaker::Bot, MessageKind::Normal, text.into());
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.push(Speaker::Bot, MessageKind::Error, text.into());
    }

    pub fn push_warning(&mut self, text: impl Into<String>) {
        self.push(Speaker::Bot, MessageKind::Warning, text.into());
    }

    fn push(&mut self, speaker: Speaker, kind: MessageKind, text: String) {
        self.entries.push(TranscriptEntry {
            speaker,
            kind,
            text,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> ChatStats {
        let user_messages = self
            .entries
            .iter()
            .filter(|e| e.speaker == Speaker::User)
            .count();
        let bot_messages = self.entries.len() - user_messages;
        ChatStats {
            user_messages,
            bot_messages,
            total_messages: user_messages + bot_messages,
        }
    }

    /// Plain-text export: `Usuario: ...` / `Bot: ...` blocks separated by a blank line.
    pub fn export_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                let label = match e.speaker {
                    Speaker::User => "Usuario",
                    Speaker::Bot => "Bot",
                };
                format!("{}: {}", label, e.text)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Write the export to `dir/chat_rag_<unix-millis>.txt`.
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        fs::create_dir_all(dir)?;
        let path = dir.join(format!("chat_rag_{}.txt", millis));
        fs::write(&path, self.export_text())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        let mut t = Transcript::new();
        t.push_user("¿Qué pena tiene el hurto?");
        t.push_bot("Según el artículo 234...");
        t.push_user("¿Y el robo?");
        t.push_error("Lo siento, hubo un error");
        t
    }

    #[test]
    fn test_stats_counts_by_speaker() {
        let stats = sample().stats();
        assert_eq!(stats.user_messages, 2);
        assert_eq!(stats.bot_messages, 2);
        assert_eq!(stats.total_messages, 4);
    }

    #[test]
    fn test_export_text_format() {
        let mut t = Transcript::new();
        t.push_user("hola");
        t.push_bot("buenas");
        assert_eq!(t.export_text(), "Usuario: hola\n\nBot: buenas");
    }

    #[test]
    fn test_export_to_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample().export_to(dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("chat_rag_"));
        assert!(name.ends_with(".txt"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Usuario: ¿Qué pena tiene el hurto?"));
    }

    #[test]
    fn test_clear() {
        let mut t = sample();
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.stats(), ChatStats::default());
    }
}
