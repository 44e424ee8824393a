use depot_storage::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn stored_names_recover_the_original(name in "[A-Za-z0-9 _().-]{1,40}\\.[a-z0-9]{1,5}") {
        let sanitized = sanitize_name(&name).unwrap();
        let namer = TimestampNamer;
        let stored = namer.stored_name(&sanitized);
        prop_assert_eq!(namer.original_name(&stored), sanitized);
    }

    #[test]
    fn classification_is_total(ext in "\\PC{0,12}") {
        let category = Category::from_extension(&ext);
        prop_assert!(Category::ALL.contains(&category));
        let owners = Category::ALL
            .iter()
            .filter(|c| c.extensions().iter().any(|known| known.eq_ignore_ascii_case(ext.trim().trim_start_matches('.'))))
            .count();
        prop_assert!(owners <= 1);
        if owners == 0 {
            prop_assert_eq!(category, Category::Other);
        }
    }

    #[test]
    fn sanitized_names_are_single_segments(raw in "[a-z./\\\\]{0,24}") {
        if let Ok(name) = sanitize_name(&raw) {
            prop_assert!(!name.contains('/'));
            prop_assert!(!name.contains('\\'));
            prop_assert!(name != "." && name != "..");
            prop_assert!(!name.is_empty());
        }
    }

    #[test]
    fn size_formatting_picks_one_unit(bytes in any::<u64>()) {
        let formatted = format_size(bytes);
        let unit = formatted.rsplit(' ').next().unwrap();
        prop_assert!(["B", "KB", "MB", "GB"].contains(&unit));
    }
}
