//! キーマップの性質テスト

use proptest::prelude::*;
use tsuzuri::input::{default_keymap, render_sequence, Command, Function, Keymap, Lookup};
use tsuzuri::Key;

fn sequence_strategy() -> impl Strategy<Value = Vec<Key>> {
    let key = prop_oneof![
        Just(Key::from_char('a')),
        Just(Key::from_char('b')),
        Just(Key::ctrl('x')),
        Just(Key::meta('c')),
    ];
    prop::collection::vec(key, 1..4)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn accepted_bindings_stay_reachable(sequences in prop::collection::vec(sequence_strategy(), 1..16)) {
        let mut map = Keymap::new();
        let mut accepted = Vec::new();
        for (index, keys) in sequences.iter().enumerate() {
            if map.bind(keys, index).is_ok() {
                accepted.push((keys.clone(), index));
            }
        }
        prop_assert!(!accepted.is_empty());

        for (keys, index) in &accepted {
            prop_assert_eq!(map.lookup(keys), Lookup::Bound(index));
            for end in 1..keys.len() {
                prop_assert_eq!(map.lookup(&keys[..end]), Lookup::Prefix);
            }
            prop_assert_eq!(map.where_is(index), vec![render_sequence(keys)]);
        }

        let mut walked = 0;
        map.walk(|_, _| walked += 1);
        prop_assert_eq!(walked, accepted.len());
    }

    #[test]
    fn rendered_sequences_parse_back(keys in sequence_strategy()) {
        let text = render_sequence(&keys);
        prop_assert_eq!(Key::parse_sequence(&text).unwrap(), keys);
    }
}

#[test]
fn default_keymap_resolves_common_keys() {
    let map = default_keymap().unwrap();
    let find_file = Key::parse_sequence("C-x C-f").unwrap();
    assert_eq!(
        map.lookup(&find_file),
        Lookup::Bound(&Function::Command(Command::FindFile))
    );
    assert_eq!(map.lookup(&[Key::ctrl('x')]), Lookup::Prefix);
    assert_eq!(map.lookup(&[Key::from_char('a')]), Lookup::Undefined);
    assert_eq!(
        map.where_is(&Function::Command(Command::Undo)),
        vec!["C-/", "C-_", "C-x u"]
    );
}

#[test]
fn rebinding_replaces_prefix() {
    let mut map = default_keymap().unwrap();
    let keys = Key::parse_sequence("C-x").unwrap();
    map.rebind(&keys, Function::Command(Command::EndOfLine)).unwrap();
    assert_eq!(
        map.lookup(&keys),
        Lookup::Bound(&Function::Command(Command::EndOfLine))
    );
    assert_eq!(
        map.lookup(&Key::parse_sequence("C-x C-f").unwrap()),
        Lookup::Undefined
    );
}
