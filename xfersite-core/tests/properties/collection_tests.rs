//! Property-based tests for the stored site collection

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use xfersite_core::models::natural_cmp;
use xfersite_core::{MemoryStorageFactory, SessionData, StoredSessionList};

// ============================================================================
// Generators
// ============================================================================

/// Strategy for distinct site names, some of them in folders
fn arb_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("([a-z]{1,5}/)?[a-z]{1,6}[0-9]{0,3}", 1..12)
}

fn stored_list(factory: &MemoryStorageFactory, names: &BTreeSet<String>) -> StoredSessionList {
    let mut list = StoredSessionList::new(Arc::new(factory.clone()));
    for (index, name) in names.iter().enumerate() {
        let mut data = SessionData::new(name.clone());
        data.set_host_name(format!("host{index}.example.com"));
        data.set_user_name("admin");
        data.set_password(&format!("pw{index}"));
        list.new_session(name, &data);
    }
    list.save(false).unwrap();
    list
}

// ============================================================================
// Collection invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Sites come back from the store with their names and secrets.
    #[test]
    fn prop_save_load_preserves_sites(names in arb_names()) {
        let factory = MemoryStorageFactory::new();
        let saved = stored_list(&factory, &names);

        let mut loaded = StoredSessionList::new(Arc::new(factory));
        loaded.load().unwrap();
        prop_assert_eq!(loaded.len(), names.len());
        for original in saved.iter() {
            let site = loaded.find_by_name(original.name()).unwrap();
            prop_assert_eq!(site.host_name(), original.host_name());
            prop_assert_eq!(site.password(), original.password());
            prop_assert!(!site.is_modified());
        }
    }

    /// Iteration follows natural name order.
    #[test]
    fn prop_sites_are_sorted(names in arb_names()) {
        let factory = MemoryStorageFactory::new();
        let list = stored_list(&factory, &names);
        let ordered: Vec<&str> = list.iter().map(SessionData::name).collect();
        for pair in ordered.windows(2) {
            prop_assert_ne!(natural_cmp(pair[0], pair[1]), std::cmp::Ordering::Greater);
        }
    }

    /// Lookups ignore case.
    #[test]
    fn prop_find_is_case_insensitive(names in arb_names()) {
        let factory = MemoryStorageFactory::new();
        let list = stored_list(&factory, &names);
        for name in &names {
            let found = list.find_by_name(&name.to_uppercase()).map(SessionData::name);
            prop_assert_eq!(found, Some(name.as_str()));
        }
    }

    /// Removing a site removes it from the store as well.
    #[test]
    fn prop_remove_persists(names in arb_names(), pick in any::<prop::sample::Index>()) {
        let factory = MemoryStorageFactory::new();
        let mut list = stored_list(&factory, &names);
        let victim = pick.get(&names.iter().collect::<Vec<_>>()).to_string();
        list.remove(&victim).unwrap();

        let mut reloaded = StoredSessionList::new(Arc::new(factory));
        reloaded.load().unwrap();
        prop_assert_eq!(reloaded.len(), names.len() - 1);
        prop_assert!(reloaded.find_by_name(&victim).is_none());
    }

    /// Folders reported by the collection hold exactly their sites.
    #[test]
    fn prop_folder_membership(names in arb_names()) {
        let factory = MemoryStorageFactory::new();
        let list = stored_list(&factory, &names);
        let folders: BTreeSet<&str> = names
            .iter()
            .filter_map(|name| name.split_once('/').map(|(folder, _)| folder))
            .collect();
        for folder in folders {
            prop_assert!(list.is_folder(folder));
            let expected = names
                .iter()
                .filter(|name| name.starts_with(&format!("{folder}/")))
                .count();
            prop_assert_eq!(list.get_folder_or_workspace(folder).len(), expected);
        }
    }
}
