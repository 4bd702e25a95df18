//! Integrity-tag behaviour: verification, forgery, key and length binding.

use scrip::{
    FieldDef, FieldKind, FieldSchema, Granularity, TicketConfig, TicketError, TicketFactory,
    TicketSpec, Value,
};

const SYMBOLS: &str = "0123456789abcdefghjkmnpqrstuvwxy";

fn hashing_factory(secret: &[u8], hash_length: u32) -> TicketFactory {
    let spec = TicketSpec::builder()
        .granularity(Granularity::Hour)
        .hash_length(hash_length)
        .build()
        .unwrap();
    let origin = FieldSchema::new(vec![FieldDef::open(0, FieldKind::I64)]).unwrap();
    let data = FieldSchema::new(vec![FieldDef::open(0, FieldKind::I64)]).unwrap();
    TicketConfig::default()
        .with_origin_schema(origin)
        .with_data_schema(data)
        .with_specs(vec![spec])
        .new_factory(&[secret])
        .unwrap()
}

// replace the symbol at `position` with a different symbol
fn tamper(string: &str, position: usize) -> String {
    let mut chars: Vec<char> = string.chars().collect();
    let replacement = if chars[position] == '5' { '6' } else { '5' };
    chars[position] = replacement;
    chars.into_iter().collect()
}

#[test]
fn valid_hash_verifies_and_forgeries_fail() {
    let factory1 = hashing_factory(b"SECRET", 32);
    let factory2 = hashing_factory(b"SEKRET", 32);
    let factory3 = hashing_factory(b"SECRET", 31);

    let ticket = factory1
        .machine_for_values(&[Value::I64(1)])
        .unwrap()
        .issue_values(&[Value::I64(7)])
        .unwrap();
    let string = ticket.to_string();

    // valid hash
    assert_eq!(factory1.decode(&string).unwrap(), ticket);

    // changed secret
    assert!(factory2.decode(&string).is_err());

    // changed ticket content
    assert!(factory1.decode(&tamper(&string, 2)).is_err());

    // changed hash length
    assert!(factory3.decode(&string).is_err());
}

#[test]
fn every_symbol_flip_is_detected() {
    let spec = TicketSpec::builder().hash_length(32).build().unwrap();
    let factory = TicketConfig::default()
        .with_specs(vec![spec])
        .new_factory(&[b"Secret Passphraze!".as_slice()])
        .unwrap();
    let string = factory.machine().unwrap().issue().unwrap().to_string();

    for (i, c) in string.chars().enumerate() {
        if !SYMBOLS.contains(c) {
            continue; // separator or padding
        }
        let result = factory.decode(&tamper(&string, i));
        // header flips surface as WrongVersion/UnknownSpec, body flips as
        // BadHash or Malformed; none may decode successfully
        assert!(result.is_err(), "flip at {i} slipped through");
    }
}

#[test]
fn unkeyed_hash_still_catches_corruption() {
    let spec = TicketSpec::builder().hash_length(50).build().unwrap();
    let factory = TicketConfig::default().with_specs(vec![spec]).new_factory(&[]).unwrap();
    let ticket = factory.machine().unwrap().issue().unwrap();
    let string = ticket.to_string();
    assert_eq!(factory.decode(&string).unwrap(), ticket);
    assert!(factory.decode(&tamper(&string, 0)).is_err());
}

#[test]
fn trailing_secret_carries_to_later_specs() {
    // one secret, two specs: the second spec reuses the first's prekey
    let s1 = TicketSpec::builder().hash_length(32).build().unwrap();
    let s2 = TicketSpec::builder()
        .granularity(Granularity::Millisecond)
        .hash_length(32)
        .build()
        .unwrap();
    let config = TicketConfig::default().with_specs(vec![s1, s2]);
    let factory = config.new_factory(&[b"K"]).unwrap();
    let ticket = factory.machine().unwrap().issue().unwrap();
    assert_eq!(ticket.spec_index(), 1);
    assert_eq!(factory.decode(&ticket.to_string()).unwrap(), ticket);
}

#[test]
fn secrets_must_not_outnumber_specs() {
    let config = TicketConfig::default();
    assert!(matches!(
        config.new_factory(&[b"a".as_slice(), b"b".as_slice()]),
        Err(TicketError::InvalidArgument(_))
    ));
}
