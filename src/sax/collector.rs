//! SAX Collector
//!
//! A [`Visitor`] that records every event as an owned [`SaxEvent`].

use super::attributes::{AttributeView, Attributes};
use super::events::SaxEvent;
use super::visitor::Visitor;
use crate::error::ParseError;
use crate::ingest::{ingest_from_stream, IngestOptions};

/// Collector that gathers events during ingestion
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<SaxEvent>,
}

impl EventCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(256),
        }
    }

    /// Create with estimated capacity
    pub fn with_capacity(events: usize) -> Self {
        Self {
            events: Vec::with_capacity(events),
        }
    }

    /// Get the collected events as a slice
    pub fn events(&self) -> &[SaxEvent] {
        &self.events
    }

    /// Take the collected events
    pub fn take_events(&mut self) -> Vec<SaxEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn into_events(self) -> Vec<SaxEvent> {
        self.events
    }

    /// Get number of collected events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

impl Visitor for EventCollector {
    fn start_xml(&mut self) {
        self.events.push(SaxEvent::StartXml);
    }

    fn start_element(&mut self, name: &str, attrs: &AttributeView<'_>) {
        self.events.push(SaxEvent::StartElement {
            name: name.to_string(),
            attributes: attrs.to_snapshot(),
        });
    }

    fn end_element(&mut self, name: &str) {
        self.events.push(SaxEvent::EndElement { name: name.to_string() });
    }

    fn data(&mut self, text: &str) {
        self.events.push(SaxEvent::Data(text.to_string()));
    }

    fn pi(&mut self, target: &str, data: &str) {
        self.events.push(SaxEvent::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
    }

    fn comment(&mut self, text: &str) {
        self.events.push(SaxEvent::Comment(text.to_string()));
    }

    fn end_xml(&mut self) {
        self.events.push(SaxEvent::EndXml);
    }
}

/// Parse an in-memory document and return its events
pub fn parse_sax(input: &[u8]) -> Result<Vec<SaxEvent>, ParseError> {
    let mut collector = EventCollector::new();
    let mut reader = input;
    ingest_from_stream(&mut reader, &mut collector, "<memory>", IngestOptions::default())?;
    Ok(collector.into_events())
}
