mod common;

use std::sync::Arc;

use common::{FixedTable, ctx};
use phrase_core::{
    Error,
    group::{GroupConfig, PhraseTableGroup},
    model::Phrase,
    phrase_table::PhraseTable,
    session::Backend,
};

fn backend(tables: Vec<FixedTable>, threads: usize) -> phrase_core::Result<Backend> {
    let members: Vec<String> = tables.iter().map(|t| t.name().to_owned()).collect();
    let cfg = GroupConfig {
        name: "group".to_owned(),
        num_features: tables.len(),
        members,
        ..GroupConfig::default()
    };
    let group = PhraseTableGroup::new(cfg, tables.into_iter().map(FixedTable::boxed).collect())?;
    Backend::new(group, threads)
}

#[test]
fn sentence_lifecycle_releases_cache_and_signals_members() {
    let a = FixedTable::new("A", 1).with("haus", "house", &[-1.0]);
    let log = a.log.clone();
    let mut backend = backend(vec![a], 1).unwrap();

    let mut sentence = backend.begin_sentence(ctx(5)).unwrap();
    let first = sentence.lookup(&Phrase::parse("haus")).unwrap();
    let batch = sentence
        .lookup_batch(&[Phrase::parse("das"), Phrase::parse("haus")])
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(batch.len(), 2);
    assert_eq!(sentence.cached(), 3);
    assert_eq!(Arc::strong_count(&first), 2);

    assert_eq!(sentence.finish(), 3);
    assert_eq!(Arc::strong_count(&first), 1);
    assert_eq!(backend.group().active_sentence(), None);

    let log = log.lock().unwrap();
    assert_eq!(log.first().map(String::as_str), Some("start 5"));
    assert_eq!(log.last().map(String::as_str), Some("end 5"));
}

#[test]
fn dropping_an_unfinished_sentence_cleans_up() {
    let a = FixedTable::new("A", 1);
    let log = a.log.clone();
    let mut backend = backend(vec![a], 1).unwrap();
    {
        let mut sentence = backend.begin_sentence(ctx(0)).unwrap();
        sentence.lookup(&Phrase::parse("haus")).unwrap();
    }
    assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("end 0"));

    let mut next = backend.begin_sentence(ctx(1)).unwrap();
    assert_eq!(next.cached(), 0);
    next.lookup(&Phrase::parse("haus")).unwrap();
    assert_eq!(next.cached(), 1);
}

#[test]
fn failed_start_is_sentence_scoped_and_unloads_members() {
    let ok = FixedTable::new("A", 1);
    let ok_log = ok.log.clone();
    let mut broken = FixedTable::new("B", 1);
    broken.fail_start = true;
    let mut backend = backend(vec![ok, broken], 1).unwrap();

    let err = backend.begin_sentence(ctx(7)).unwrap_err();
    assert_eq!(err.translation_id(), Some(7));
    assert!(matches!(err, Error::Resource { ref table, .. } if table == "B"));
    assert_eq!(*ok_log.lock().unwrap(), vec!["start 7", "end 7"]);
    assert_eq!(backend.group().active_sentence(), None);
}

#[test]
fn multi_threaded_backend_rejects_single_threaded_members() {
    let mut a = FixedTable::new("A", 1);
    a.thread_safe = false;
    let err = backend(vec![a], 2).unwrap_err();
    assert!(matches!(err, Error::NotThreadSafe { ref table, threads: 2 } if table == "A"));
}
