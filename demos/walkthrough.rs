//! A guided tour of the ticket pipeline: issue, format, decode, hash,
//! roll specifications forward.
//!
//! Run with `cargo run --example walkthrough`.

use scrip::{Granularity, TicketConfig, TicketError, TicketFormat, TicketSpec};

fn main() -> Result<(), TicketError> {
    // Tickets are created via factories. The simplest factory uses the
    // default configuration: no origin, no data, second-granular
    // timestamps counted from 2015, no hash.
    let factory = TicketConfig::default().new_factory(&[])?;
    let ticket = factory.machine()?.issue()?;

    // The Display form is the shareable ASCII surface, something like
    // "55wwn-gd00z".
    println!("fresh ticket:   {ticket}");

    // Formatting is presentation only and can be changed at any time.
    factory.set_format(TicketFormat::new(true, 3, '.', false)?);
    println!("re-rendered:    {}", factory.format().encode(ticket.bits(), 256)?);

    // Changing the format does not stop the factory decoding tickets it
    // issued under older formats.
    let decoded = factory.decode(&ticket.to_string())?;
    assert_eq!(decoded, ticket);

    // Every ticket carries a timestamp and a sequence number that
    // disambiguates tickets sharing one.
    println!(
        "issued at {} ms, sequence {}",
        ticket.timestamp_millis(),
        ticket.sequence_number()
    );

    // A custom specification buys precision and an integrity tag. With a
    // secret supplied at factory construction the tag also defends
    // against forgery.
    let spec = TicketSpec::builder()
        .granularity(Granularity::Millisecond)
        .origin_year(2016)
        .hash_length(32)
        .build()?;
    let secret: &[u8] = b"Secret Passphraze!";
    let hashed = TicketConfig::default()
        .with_specs(vec![spec.clone()])
        .new_factory(&[secret])?
        .machine()?
        .issue()?;
    println!("hashed ticket:  {hashed}");
    assert_eq!(hashed.spec().hash_length(), 32);

    // Rolling a live system onto a new specification means appending it:
    // new tickets use the latest spec, historical tickets still decode.
    let new_spec = TicketSpec::builder()
        .granularity(Granularity::Millisecond)
        .origin_year(2016)
        .hash_length(50)
        .build()?;
    let later_factory = TicketConfig::default()
        .with_specs(vec![spec, new_spec])
        .new_factory(&[secret])?;

    let historical = later_factory.decode(&hashed.to_string())?;
    assert_eq!(historical, hashed);
    let fresh = later_factory.machine()?.issue()?;
    assert_eq!(fresh.spec().hash_length(), 50);
    println!("rolled over:    {fresh}");

    // Supplying one secret per spec rotates keys without invalidating
    // tickets hashed under the old one.
    let rotated: &[u8] = b"New Seekret Passphraze!";
    later_factory.decode(&hashed.to_string())?;
    let _ = TicketConfig::default()
        .with_specs(later_factory.config().specs().to_vec())
        .new_factory(&[secret, rotated])?;

    Ok(())
}
