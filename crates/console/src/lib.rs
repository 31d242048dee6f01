//! Terminal front end for a configurator session.

use std::io::Write;
use std::sync::Mutex;

use fenestra_engine::{ConfiguratorView, Facet};
use fenestra_infra::{ChatMessage, Presenter};

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pick the n-th option (1-based) of the current question.
    Pick(usize),
    Restart,
    Specialist,
    Quit,
    Chat(String),
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if let Ok(n) = line.parse::<usize>() {
        return Command::Pick(n);
    }
    match line.to_lowercase().as_str() {
        "/reiniciar" | "/restart" => Command::Restart,
        "/especialista" | "/specialist" => Command::Specialist,
        "/sair" | "/quit" => Command::Quit,
        _ => Command::Chat(line.to_string()),
    }
}

/// Option `n` (1-based) of the question in `view`, as `(facet, code)`.
pub fn option_at(view: &ConfiguratorView, n: usize) -> Option<(Facet, String)> {
    match view {
        ConfiguratorView::Question { facet, options, .. } => n
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .map(|o| (*facet, o.value.clone())),
        _ => None,
    }
}

/// Writes views and chat lines as plain text.
pub struct TerminalPresenter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalPresenter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn emit(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = writeln!(out, "{text}").and_then(|_| out.flush()) {
            tracing::warn!(error = %err, "terminal write failed");
        }
    }
}

pub fn format_view(view: &ConfiguratorView) -> String {
    match view {
        ConfiguratorView::Question { prompt, options, .. } => {
            let mut text = format!("\n{prompt}");
            for (i, option) in options.iter().enumerate() {
                text.push_str(&format!("\n  {}) {}", i + 1, option.label));
            }
            text
        }
        ConfiguratorView::Products { heading, cards } => {
            let mut text = format!("\n{heading}");
            for card in cards {
                text.push_str(&format!(
                    "\n  - {} [{}] largura {:.2}-{:.2} m\n    {}",
                    card.title,
                    card.chips.join(", "),
                    card.width.min_m,
                    card.width.max_m,
                    card.link
                ));
            }
            text
        }
        ConfiguratorView::NoMatch { message } | ConfiguratorView::Unavailable { message } => {
            format!("\n{message}")
        }
    }
}

impl Presenter for TerminalPresenter {
    fn show(&self, view: &ConfiguratorView) {
        self.emit(&format_view(view));
    }

    fn say(&self, message: &ChatMessage) {
        match message {
            // Already on screen: the user typed it.
            ChatMessage::User(_) => {}
            ChatMessage::Bot(text) => self.emit(&format!("bot> {text}")),
            ChatMessage::Assistant(text) => self.emit(&format!("ia> {text}")),
            ChatMessage::Link { text, url } => self.emit(&format!("bot> {text}\n     {url}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenestra_engine::{NO_MATCH_MESSAGE, OptionCard};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn question() -> ConfiguratorView {
        let card = |value: &str, label: &str| OptionCard {
            facet: Facet::Category,
            value: value.to_string(),
            label: label.to_string(),
            image: String::new(),
        };
        ConfiguratorView::Question {
            facet: Facet::Category,
            prompt: "O que você procura?".to_string(),
            options: vec![card("janela", "Janela"), card("porta", "Porta")],
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("  2 "), Command::Pick(2));
        assert_eq!(parse_command("/Reiniciar"), Command::Restart);
        assert_eq!(parse_command("/especialista"), Command::Specialist);
        assert_eq!(parse_command("/sair"), Command::Quit);
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(
            parse_command("quero uma porta"),
            Command::Chat("quero uma porta".to_string())
        );
    }

    #[test]
    fn option_numbers_are_one_based() {
        let view = question();
        assert_eq!(option_at(&view, 1), Some((Facet::Category, "janela".to_string())));
        assert_eq!(option_at(&view, 2), Some((Facet::Category, "porta".to_string())));
        assert_eq!(option_at(&view, 0), None);
        assert_eq!(option_at(&view, 3), None);
        let no_match = ConfiguratorView::NoMatch {
            message: NO_MATCH_MESSAGE.to_string(),
        };
        assert_eq!(option_at(&no_match, 1), None);
    }

    #[test]
    fn presenter_writes_numbered_options_and_chat_lines() {
        let buf = SharedBuf::default();
        let presenter = TerminalPresenter::new(Box::new(buf.clone()));

        presenter.show(&question());
        presenter.say(&ChatMessage::User("oi".into()));
        presenter.say(&ChatMessage::Assistant("Olá!".into()));

        let written = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(written.contains("O que você procura?\n  1) Janela\n  2) Porta\n"));
        assert!(written.ends_with("ia> Olá!\n"));
        assert!(!written.contains("> oi"));
    }
}
