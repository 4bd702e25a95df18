#![no_main]

use libfuzzer_sys::fuzz_target;
use scrip::{FieldDef, FieldKind, FieldSchema, TicketConfig, TicketFactory, TicketSpec};
use std::sync::OnceLock;

fn factories() -> &'static [TicketFactory; 2] {
    static FACTORIES: OnceLock<[TicketFactory; 2]> = OnceLock::new();
    FACTORIES.get_or_init(|| {
        let plain = TicketConfig::default().new_factory(&[]).unwrap();
        let schema = FieldSchema::new(vec![
            FieldDef::open(0, FieldKind::Str),
            FieldDef::secret(1, FieldKind::I64),
        ])
        .unwrap();
        let spec = TicketSpec::builder().hash_length(32).build().unwrap();
        let secured = TicketConfig::default()
            .with_data_schema(schema)
            .with_specs(vec![spec])
            .new_factory(&[b"fuzz key"])
            .unwrap();
        [plain, secured]
    })
}

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else { return };
    for factory in factories() {
        let _ = factory.decode(input);
    }
});
