mod common;

use common::*;
use proptest::prelude::*;
use xmlfeed::{Dispatcher, EventCollector, SaxEvent};

fn dispatch_split(input: &[u8], cuts: &[usize]) -> Vec<SaxEvent> {
    let mut dispatcher = Dispatcher::new("split.xml");
    let mut collector = EventCollector::new();
    let mut from = 0;
    for &cut in cuts {
        let to = cut.min(input.len()).max(from);
        dispatcher.feed(&input[from..to], &mut collector).unwrap();
        from = to;
    }
    dispatcher.feed(&input[from..], &mut collector).unwrap();
    dispatcher.finish(&mut collector).unwrap();
    collector.into_events()
}

fn attr_name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9._-]{0,8}"
}

fn attr_value() -> impl Strategy<Value = String> {
    "[ -~ä€]{0,12}"
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn split_points_do_not_change_events(seed in any::<u64>(), mut cuts in prop::collection::vec(0usize..8192, 0..40)) {
        let doc = generate_document(4096, seed);
        cuts.sort_unstable();

        let whole = events_of(doc.as_bytes(), doc.len()).unwrap();
        let split = dispatch_split(doc.as_bytes(), &cuts);
        prop_assert!(split == whole);
    }

    #[test]
    fn attributes_arrive_in_document_order(
        attrs in prop::collection::btree_map(attr_name(), attr_value(), 0..12),
        shuffle in any::<u64>(),
    ) {
        // Distinct names, in an order unrelated to their sort order
        let mut pairs: Vec<(String, String)> = attrs.into_iter().collect();
        let mut rng = Lcg::new(shuffle);
        for i in (1..pairs.len()).rev() {
            let j = rng.below(i as u64 + 1) as usize;
            pairs.swap(i, j);
        }

        let mut doc = String::from("<e");
        for (name, value) in &pairs {
            doc.push(' ');
            doc.push_str(name);
            doc.push_str("=\"");
            doc.push_str(&escape(value));
            doc.push('"');
        }
        doc.push_str("/>");

        let events = events_of(doc.as_bytes(), 5).unwrap();
        let SaxEvent::StartElement { attributes, .. } = &events[1] else {
            panic!("expected start_element, got {}", events[1]);
        };
        let got: Vec<(String, String)> = attributes.clone().into_pairs();
        prop_assert_eq!(got, pairs);
    }
}
