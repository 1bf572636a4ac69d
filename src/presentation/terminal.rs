use crate::domain::results::ActionKey;

use super::document::{Document, RenderedResult, ResultsView};

/// Results view that mirrors every change of the document to the terminal.
///
/// Result changes go to stdout; blocking notifications go to stderr.
#[derive(Debug, Default)]
pub struct TerminalView {
    document: Document,
}

impl TerminalView {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Prints the region as markup, one result per line.
    pub fn print(&self) {
        if let Some(reason) = self.document.error() {
            println!("error: {reason}");
            return;
        }
        if self.document.elements().is_empty() {
            println!("(no results)");
            return;
        }
        for element in self.document.elements() {
            match element.to_html() {
                Ok(html) => println!("{html}"),
                Err(err) => eprintln!("! {err}"),
            }
        }
    }
}

impl ResultsView for TerminalView {
    fn show_results(&mut self, results: Vec<RenderedResult>) {
        let count = results.len();
        self.document.show_results(results);
        println!("-- {count} result(s)");
        self.print();
    }

    fn show_error(&mut self, reason: &str) {
        self.document.show_error(reason);
        println!("error: {reason}");
    }

    fn has_revoke_control(&self, action: &ActionKey) -> bool {
        self.document.has_revoke_control(action)
    }

    fn mark_revoke_pending(&mut self, action: &ActionKey) -> bool {
        self.document.mark_revoke_pending(action)
    }

    fn replace_revoke_content(&mut self, action: &ActionKey, text: &str) -> bool {
        let replaced = self.document.replace_revoke_content(action, text);
        if replaced {
            println!("{action}: {text}");
        }
        replaced
    }

    fn notify(&mut self, message: &str) {
        self.document.notify(message);
        eprintln!("! {message}");
    }
}
