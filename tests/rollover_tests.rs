//! Specification history: old tickets stay decodable after a rollover.

use scrip::{Granularity, TicketConfig, TicketError, TicketSpec};

fn second_spec() -> TicketSpec {
    TicketSpec::builder().granularity(Granularity::Second).build().unwrap()
}

fn millis_spec() -> TicketSpec {
    TicketSpec::builder()
        .granularity(Granularity::Millisecond)
        .hash_length(50)
        .build()
        .unwrap()
}

#[test]
fn rolled_over_factory_decodes_historical_tickets() {
    let secret: &[u8] = b"rollover key";

    // yesterday's deployment: one hashless second-granular spec
    let old = TicketConfig::default()
        .with_specs(vec![second_spec()])
        .new_factory(&[secret])
        .unwrap();
    let historical = old.machine().unwrap().issue().unwrap();

    // today's deployment adds a hashed millisecond spec as primary
    let new = TicketConfig::default()
        .with_specs(vec![second_spec(), millis_spec()])
        .new_factory(&[secret, secret])
        .unwrap();

    let decoded = new.decode(&historical.to_string()).unwrap();
    assert_eq!(decoded, historical);
    assert_eq!(decoded.spec_index(), 0);
    assert_eq!(decoded.spec().hash_length(), 0);

    let fresh = new.machine().unwrap().issue().unwrap();
    assert_eq!(fresh.spec_index(), 1);
    assert_eq!(fresh.spec().hash_length(), 50);
    assert_eq!(new.decode(&fresh.to_string()).unwrap(), fresh);
}

#[test]
fn historical_decoding_spans_several_generations() {
    let generations = [
        vec![second_spec()],
        vec![second_spec(), millis_spec()],
        vec![
            second_spec(),
            millis_spec(),
            TicketSpec::builder()
                .granularity(Granularity::Minute)
                .hash_length(32)
                .build()
                .unwrap(),
        ],
    ];
    let mut issued = Vec::new();
    for specs in &generations {
        let factory = TicketConfig::default()
            .with_specs(specs.clone())
            .new_factory(&[])
            .unwrap();
        issued.push(factory.machine().unwrap().issue().unwrap());
    }

    let latest = TicketConfig::default()
        .with_specs(generations[2].clone())
        .new_factory(&[])
        .unwrap();
    for (k, ticket) in issued.iter().enumerate() {
        let decoded = latest.decode(&ticket.to_string()).unwrap();
        assert_eq!(&decoded, ticket, "generation {k}");
        assert_eq!(decoded.spec_index(), k);
    }
}

#[test]
fn a_newer_spec_index_is_rejected_by_an_older_factory() {
    let new = TicketConfig::default()
        .with_specs(vec![second_spec(), millis_spec()])
        .new_factory(&[])
        .unwrap();
    let fresh = new.machine().unwrap().issue().unwrap();

    let old = TicketConfig::default()
        .with_specs(vec![second_spec()])
        .new_factory(&[])
        .unwrap();
    assert_eq!(old.decode(&fresh.to_string()), Err(TicketError::UnknownSpec(1)));
}
