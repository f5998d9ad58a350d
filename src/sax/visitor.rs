//! Visitor Trait
//!
//! The application side of ingestion. Every method has a no-op default so a
//! visitor only implements the events it cares about.

use super::attributes::AttributeView;

/// Receiver of parse events, called synchronously in document order.
///
/// String arguments and the attribute view borrow parser memory and are
/// only valid during the call. Copy what you need to keep (for attributes,
/// via [`Attributes::to_snapshot`](super::Attributes::to_snapshot)).
pub trait Visitor {
    /// Once, before the first chunk is parsed
    fn start_xml(&mut self) {}

    /// Opening tag, or the first half of a self-closing tag
    fn start_element(&mut self, _name: &str, _attrs: &AttributeView<'_>) {}

    /// Closing tag; names arrive in reverse order of their `start_element`
    fn end_element(&mut self, _name: &str) {}

    /// Character data, references decoded. CDATA sections arrive here too.
    ///
    /// Internal entity replacement text is delivered as text, so markup
    /// inside a declared entity (`<!ENTITY e '<b/>'>`) arrives verbatim.
    fn data(&mut self, _text: &str) {}

    /// Processing instruction (the XML declaration is not reported)
    fn pi(&mut self, _target: &str, _data: &str) {}

    fn comment(&mut self, _text: &str) {}

    /// Once, after the whole document parsed successfully
    fn end_xml(&mut self) {}
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn start_xml(&mut self) {
        (**self).start_xml()
    }

    fn start_element(&mut self, name: &str, attrs: &AttributeView<'_>) {
        (**self).start_element(name, attrs)
    }

    fn end_element(&mut self, name: &str) {
        (**self).end_element(name)
    }

    fn data(&mut self, text: &str) {
        (**self).data(text)
    }

    fn pi(&mut self, target: &str, data: &str) {
        (**self).pi(target, data)
    }

    fn comment(&mut self, text: &str) {
        (**self).comment(text)
    }

    fn end_xml(&mut self) {
        (**self).end_xml()
    }
}

impl<V: Visitor + ?Sized> Visitor for Box<V> {
    fn start_xml(&mut self) {
        (**self).start_xml()
    }

    fn start_element(&mut self, name: &str, attrs: &AttributeView<'_>) {
        (**self).start_element(name, attrs)
    }

    fn end_element(&mut self, name: &str) {
        (**self).end_element(name)
    }

    fn data(&mut self, text: &str) {
        (**self).data(text)
    }

    fn pi(&mut self, target: &str, data: &str) {
        (**self).pi(target, data)
    }

    fn comment(&mut self, text: &str) {
        (**self).comment(text)
    }

    fn end_xml(&mut self) {
        (**self).end_xml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ingest_from_stream, IngestOptions};
    use crate::sax::{EventCollector, SaxEvent};

    #[test]
    fn test_boxed_visitor_forwards_events() {
        let mut collector = EventCollector::new();
        {
            let mut boxed: Box<dyn Visitor + '_> = Box::new(&mut collector);
            let mut reader = "<a x='1'>t<?p d?><!--c--></a>".as_bytes();
            ingest_from_stream(&mut reader, &mut boxed, "boxed.xml", IngestOptions::default()).unwrap();
        }
        let events = collector.into_events();
        assert_eq!(events.len(), 7);
        assert_eq!(events[0], SaxEvent::StartXml);
        assert_eq!(events[2], SaxEvent::Data("t".to_string()));
        assert_eq!(events[6], SaxEvent::EndXml);
    }

    #[test]
    fn test_entity_markup_is_text() {
        let mut collector = EventCollector::new();
        let mut reader = "<!DOCTYPE r [<!ENTITY e '<b/>'>]><r>&e;</r>".as_bytes();
        ingest_from_stream(&mut reader, &mut collector, "ent.xml", IngestOptions::default()).unwrap();
        assert_eq!(collector.events()[2], SaxEvent::Data("<b/>".to_string()));
    }
}
