#![no_main]

use libfuzzer_sys::fuzz_target;
use spotstat::core::Session;
use spotstat::ingest::{Ingestor, SourceFile};
use spotstat::query::QueryState;
use time::UtcOffset;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut session = Session::new(Ingestor::new(UtcOffset::UTC), QueryState::new(10));
    let split = text.len() / 2;
    let files = match text.get(..split).zip(text.get(split..)) {
        Some((first, second)) => vec![
            SourceFile::new("first.json", first),
            SourceFile::new("second.json", second),
        ],
        None => vec![SourceFile::new("whole.json", text.as_ref())],
    };

    if session.load_batch(&files).is_err() {
        assert_eq!(session.view().file_count, 0);
        return;
    }

    for (idx, byte) in data.iter().take(32).enumerate() {
        match byte % 5 {
            0 => session.next_page(),
            1 => session.cycle_column(),
            2 => session.toggle_year(2000 + i32::from(*byte % 30)),
            3 => session.set_search(text.get(..idx).unwrap_or_default()),
            _ => session.last_page(),
        }
        let view = session.view();
        assert!(view.page.rows.len() <= 10);
    }
});
