//! End-to-end build/read/validate tests over the bundled ORDERS kind.

use edifact::kinds::{Order, OrderLine, Orders, Party};
use edifact::{
    Blueprint, BlueprintNode as N, BlueprintSpec, ConfigError, ConfigValue, Error, FileStream,
    MemoryStream, MessageBuilder, MessageReader, SegmentCursor, Setting, ValidationError, keys,
};
use proptest::prelude::*;

fn order(number: usize, lines: usize, supplier: bool) -> Order {
    Order {
        number: format!("PO{number}"),
        date: "20261016".to_string(),
        buyer: Party::new("5412345000013"),
        supplier: supplier.then(|| Party::new("4012345000023")),
        lines: (0..lines)
            .map(|i| {
                let line = OrderLine::new(format!("40008621414{i:02}"), i as u32 + 1);
                if i % 2 == 0 { line.with_price("1.25") } else { line }
            })
            .collect(),
    }
}

/// Segment tags `Orders` writes for one order.
fn message_tags(order: &Order) -> Vec<&'static str> {
    let mut tags = vec!["UNH", "BGM", "DTM", "NAD"];
    if order.supplier.is_some() {
        tags.push("NAD");
    }
    for line in &order.lines {
        tags.push("LIN");
        tags.push("QTY");
        if line.price.is_some() {
            tags.push("PRI");
        }
    }
    tags.push("UNS");
    tags.push("UNT");
    tags
}

fn read_tags<S: edifact::Stream>(reader: &mut MessageReader<Orders, S>) -> Vec<&'static str> {
    reader.rewind().unwrap();
    let mut tags = Vec::new();
    while let Some(segment) = reader.next_segment().unwrap() {
        tags.push(segment.tag());
    }
    reader.rewind().unwrap();
    tags
}

proptest! {
    #[test]
    fn prop_counts_and_round_trip(
        shapes in prop::collection::vec((1usize..5, any::<bool>()), 1..8),
    ) {
        let orders: Vec<Order> = shapes
            .iter()
            .enumerate()
            .map(|(i, (lines, supplier))| order(i, *lines, *supplier))
            .collect();

        let mut builder = MessageBuilder::new(Orders::new(), "SENDER", "RECEIVER");
        let mut expected = vec!["UNA", "UNB"];
        for (i, order) in orders.iter().enumerate() {
            builder.add_message(order).unwrap();
            let written = message_tags(order);
            prop_assert_eq!(builder.unh_count(), written.len());
            prop_assert_eq!(builder.message_count(), i + 1);
            expected.extend(written);
        }
        expected.push("UNZ");

        let mut reader = builder.get_or_fail().unwrap();
        let tags = read_tags(&mut reader);
        prop_assert_eq!(&tags, &expected);
        prop_assert_eq!(tags.iter().filter(|t| **t == "UNA").count(), 1);
        prop_assert_eq!(tags.iter().filter(|t| **t == "UNB").count(), 1);

        // every UNT carries the segment count of its message
        let mut message = 0;
        while let Some(unt) = reader.find_next_segment("UNT").unwrap() {
            let count: usize = unt.value(0, 0).unwrap().parse().unwrap();
            let reference = (message + 1).to_string();
            prop_assert_eq!(count, message_tags(&orders[message]).len());
            prop_assert_eq!(unt.value(1, 0), Some(reference.as_str()));
            message += 1;
        }
        prop_assert_eq!(message, orders.len());

        let message_count = orders.len().to_string();
        let unz = reader.find_from_start("UNZ").unwrap().unwrap();
        prop_assert_eq!(unz.value(0, 0), Some(message_count.as_str()));
    }

    #[test]
    fn prop_optional_loop_repeats(repeats in 0usize..6) {
        let spec = BlueprintSpec::new(vec![
            N::mandatory("AAA"),
            N::optional_loop(vec![N::mandatory("BBB")]),
            N::mandatory("CCC"),
        ]);
        let mut blueprint = Blueprint::new(&spec);
        blueprint.accept("AAA").unwrap();
        for _ in 0..repeats {
            prop_assert!(blueprint.accept("BBB").is_ok());
        }
        prop_assert!(blueprint.accept("CCC").is_ok());
        prop_assert_eq!(blueprint.depth(), 0);
    }
}

#[test]
fn test_unexpected_segment_reported() {
    let spec = BlueprintSpec::new(vec![
        N::mandatory("AAA"),
        N::optional_loop(vec![N::mandatory("BBB")]),
        N::mandatory("CCC"),
    ]);
    let mut blueprint = Blueprint::new(&spec);
    blueprint.accept("AAA").unwrap();
    let err = blueprint.accept("DDD").unwrap_err();
    assert_eq!(
        err,
        ValidationError::UnexpectedSegment {
            expected: Some("CCC".to_string()),
            actual: "DDD".to_string(),
            position: 2,
        }
    );
    assert_eq!(
        err.to_string(),
        "[E003] unexpected segment DDD at position 2, expected CCC"
    );
}

#[test]
fn test_empty_builder() {
    let builder = MessageBuilder::new(Orders::new(), "SENDER", "RECEIVER");
    let mut reader = builder.get().unwrap();
    assert!(reader.next_segment().unwrap().is_none());
    assert_eq!(reader.position(), 0);
    reader.validate().unwrap();
}

#[test]
fn test_prebuild_locked() {
    let mut builder = MessageBuilder::new(Orders::new(), "SENDER", "RECEIVER");
    builder
        .add_prebuild_config(keys::INTERCHANGE_REFERENCE, Setting::literal("FIRST"))
        .unwrap();
    builder.add_message(&order(1, 1, false)).unwrap();
    assert!(matches!(
        builder.add_prebuild_config(keys::INTERCHANGE_REFERENCE, Setting::literal("SECOND")),
        Err(ConfigError::Locked { .. })
    ));
    assert_eq!(builder.interchange_reference().unwrap(), "FIRST");
}

#[test]
fn test_pin_restores_once() {
    let mut builder = MessageBuilder::new(Orders::new(), "SENDER", "RECEIVER");
    builder.add_message(&order(1, 2, true)).unwrap();
    let mut reader = builder.get().unwrap();

    reader.find_next_segment("LIN").unwrap();
    reader.pin().unwrap();
    let second = reader
        .find_next_segment("LIN")
        .unwrap()
        .and_then(|s| s.value(0, 0).map(str::to_string));
    assert_eq!(second.as_deref(), Some("2"));

    reader.jump_to_pin().unwrap();
    assert_eq!(reader.current().unwrap().and_then(|s| s.value(0, 0)), Some("1"));
    reader.advance().unwrap();
    assert_eq!(reader.current().unwrap().map(|s| s.tag()), Some("QTY"));

    let here = reader.jump_to_pin().unwrap();
    assert_eq!(reader.current().unwrap().map(|s| s.tag()), Some("QTY"));
    assert_eq!(reader.jump_to_pin().unwrap(), here);
}

#[test]
fn test_reader_over_foreign_text() {
    let text = "UNA:+.? '\n\
UNB+UNOC:3+SENDER:14+RECEIVER:14+261016:0930+REF9'\n\
UNH+1+ORDERS:D:96A:UN'\n\
BGM+220+PO?+1+9'\n\
DTM+137:20261016:102'\n\
LIN+1++4000862141404:EN'\n\
QTY+21:3'\n\
UNS+S'\n\
UNT+7+1'\n\
UNZ+1+REF9'\n";
    let mut reader = MessageReader::new(Orders::new(), MemoryStream::from_text(text)).unwrap();
    reader.validate().unwrap();
    reader.validate_segments().unwrap();
    let bgm = reader.find_next_segment("BGM").unwrap().unwrap();
    assert_eq!(bgm.value(1, 0), Some("PO+1"));
}

#[test]
fn test_unknown_segment_in_stream() {
    let text = "UNA:+.? 'UNB+UNOC:3+S:14+R:14+261016:0930+REF9'\
                UNH+1+ORDERS:D:96A:UN'FTX+AAI+hello'";
    let mut reader = MessageReader::new(Orders::new(), MemoryStream::from_text(text)).unwrap();
    let err = reader.validate().unwrap_err();
    assert_eq!(err.code(), edifact::ErrorCode::Segment);
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_file_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let abandoned = dir.path().join("abandoned.edi");
    let kept = dir.path().join("kept.edi");

    {
        let mut builder = MessageBuilder::with_stream(
            Orders::new(),
            "SENDER",
            "RECEIVER",
            FileStream::create(&abandoned).unwrap(),
        );
        builder.add_message(&order(1, 1, false)).unwrap();
        let mut bad = order(2, 1, false);
        bad.date = "2026-10-16".to_string();
        assert!(matches!(builder.add_message(&bad), Err(Error::Validation(_))));
    }
    assert!(!abandoned.exists());

    let stream = FileStream::create(&kept).unwrap();
    let mut builder = MessageBuilder::with_stream(Orders::new(), "SENDER", "RECEIVER", stream);
    builder.add_postbuild_config("archived_at", Setting::literal(ConfigValue::Timestamp(0)));
    builder.add_message(&order(1, 3, true)).unwrap();
    let mut reader = builder.get_or_fail().unwrap();
    assert_eq!(
        reader.configuration("archived_at").unwrap(),
        &ConfigValue::Timestamp(0)
    );
    let written = reader.to_edifact_string().unwrap();
    drop(reader);

    assert_eq!(std::fs::read_to_string(&kept).unwrap(), written);
}
