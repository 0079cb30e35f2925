#![no_main]

use libfuzzer_sys::fuzz_target;
use soundmatch::{parse_embedding, search, Index, IndexKind, TrackRecord};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(query) = parse_embedding(text) else {
        return;
    };
    assert!(!query.is_empty());

    let mut index = Index::create(query.len().min(4096), IndexKind::FlatL2).unwrap();
    let row = vec![0.5f32; index.dimension()];
    index.add(&[row], vec![TrackRecord::new("probe.wav")]).unwrap();

    // Either a ranked match or a dimension error, never a panic
    if let Ok(matches) = search(&index, &query, 1) {
        assert_eq!(matches.len(), 1);
        assert!((0.0..=1.0).contains(&matches[0].similarity_score));
    }
});
