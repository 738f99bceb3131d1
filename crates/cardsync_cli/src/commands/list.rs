//! List command implementation.

use super::{write_card, write_summary};
use cardsync_engine::{FlashCard, SyncController, Transport};
use serde::Serialize;
use std::io::Write;

/// Collection as printed by `list --format json`.
#[derive(Debug, Serialize)]
pub struct ListOutput {
    /// Number of cards.
    pub total: usize,
    /// Number of learned cards.
    pub learned: usize,
    /// Cards in display order.
    pub cards: Vec<FlashCard>,
}

/// Runs the list command.
pub async fn run<T: Transport + 'static>(
    controller: &SyncController<T>,
    show_answers: bool,
    format: &str,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    if format != "text" && format != "json" {
        return Err(format!("unknown format: {format}").into());
    }

    controller.load().await?;
    let store = controller.store();

    if format == "json" {
        let summary = store.summary();
        let output = ListOutput {
            total: summary.total,
            learned: summary.learned,
            cards: store.cards(),
        };
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
    } else {
        for card in store.cards() {
            write_card(out, &card, show_answers)?;
        }
        write_summary(out, store)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{card, controller, output};

    #[tokio::test]
    async fn text_lists_cards_and_summary() {
        let controller = controller(&[card("Q1", true), card("Q2", false)]);
        let mut out = Vec::new();

        run(&controller, true, "text", &mut out).await.unwrap();

        let text = output(out);
        assert!(text.contains("Q1 => answer to Q1"));
        assert!(text.contains("Q2"));
        assert!(text.ends_with("2 Flash Cards | 1 Learned\n"));
    }

    #[tokio::test]
    async fn json_output_parses() {
        let controller = controller(&[card("Q1", false)]);
        let mut out = Vec::new();

        run(&controller, false, "json", &mut out).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["cards"][0]["question"], "Q1");
    }

    #[tokio::test]
    async fn unknown_format_fails_before_loading() {
        let controller = controller(&[]);
        let mut out = Vec::new();

        assert!(run(&controller, false, "yaml", &mut out).await.is_err());
        assert_eq!(controller.transport().request_count(), 0);
    }
}
