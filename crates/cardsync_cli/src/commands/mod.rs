//! CLI command implementations.

pub mod add;
pub mod delete;
pub mod edit;
pub mod list;
pub mod restore;
pub mod toggle;

use cardsync_engine::{
    CardId, CollectionStore, FaultInjectingTransport, FlashCard, ReqwestClient, SyncConfig,
    SyncController,
};
use std::io::Write;
use tracing::debug;

/// Controller talking to a real server.
pub type HttpController = SyncController<FaultInjectingTransport<ReqwestClient>>;

/// Builds a controller for the configured host.
pub fn connect(config: SyncConfig) -> Result<HttpController, Box<dyn std::error::Error>> {
    debug!(url = %config.collection_url(), fault = ?config.fault, "connecting");
    let client = ReqwestClient::new(config.timeout)?;
    let transport = FaultInjectingTransport::new(client, config.fault.clone());
    Ok(SyncController::new(config, transport))
}

/// Parses a card ID argument.
pub fn parse_id(id: &str) -> Result<CardId, Box<dyn std::error::Error>> {
    Ok(CardId::parse(id.trim())?)
}

/// Writes one card as a line.
pub fn write_card(
    out: &mut impl Write,
    card: &FlashCard,
    show_answer: bool,
) -> std::io::Result<()> {
    let mark = if card.learned { 'x' } else { ' ' };
    write!(out, "[{mark}] {}  {}", card.id, card.question)?;
    if show_answer {
        write!(out, " => {}", card.answer)?;
    }
    writeln!(out)
}

/// Writes the "N Flash Cards | M Learned" line.
pub fn write_summary(out: &mut impl Write, store: &CollectionStore) -> std::io::Result<()> {
    let summary = store.summary();
    writeln!(
        out,
        "{} Flash Cards | {} Learned",
        summary.total, summary.learned
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use cardsync_engine::{CardId, FlashCard, MockTransport, SyncConfig, SyncController};
    use chrono::{TimeZone, Utc};

    pub fn card(question: &str, learned: bool) -> FlashCard {
        let mut card = FlashCard::new(
            CardId::new(),
            question,
            format!("answer to {question}"),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        );
        card.learned = learned;
        card
    }

    pub fn controller(cards: &[FlashCard]) -> SyncController<MockTransport> {
        let transport = MockTransport::new();
        transport.set_cards(cards);
        SyncController::new(SyncConfig::default(), transport)
    }

    pub fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }
}
