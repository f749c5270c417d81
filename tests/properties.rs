//! Property tests for the line patchers

use javet_patcher::android::transform_source;
use javet_patcher::node::{patch_makefile_text, MakeFlags};
use javet_patcher::v8::{patch_cflags_line, EXCLUDE_CFLAGS, INCLUDE_CFLAGS};
use javet_patcher::{LineSeparator, Target, Version, VersionUpdater};
use proptest::prelude::*;
use regex::Regex;

fn makefile_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("CFLAGS_Release := \\".to_string()),
        Just("CFLAGS_CC_Release := -O3".to_string()),
        Just("LDFLAGS_Release := \\".to_string()),
        Just("\t-pthread \\".to_string()),
        Just("    -fPIC \\".to_string()),
        Just(String::new()),
        "[a-z_ :=-]{0,16}",
    ]
}

fn cflags_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("-Werror".to_string()),
        Just("-Wno-invalid-offsetof".to_string()),
        Just("-O3".to_string()),
        Just(String::new()),
        "-[a-zA-Z]{1,8}",
    ]
}

proptest! {
    #[test]
    fn makefile_patch_is_idempotent(lines in prop::collection::vec(makefile_line(), 0..12)) {
        for flags in [MakeFlags::PIC, MakeFlags::PIC_TLS] {
            let once = patch_makefile_text(&lines.join("\n"), flags);
            prop_assert_eq!(patch_makefile_text(&once, flags), once);
        }
    }

    #[test]
    fn cflags_patch_is_idempotent(tokens in prop::collection::vec(cflags_token(), 0..8)) {
        let line = format!("cflags = {}", tokens.join(" "));
        let once = patch_cflags_line(&line, &INCLUDE_CFLAGS, &EXCLUDE_CFLAGS);

        prop_assert!(!once.split(' ').any(|flag| flag == "-Werror"));
        for flag in INCLUDE_CFLAGS {
            prop_assert!(once.split(' ').any(|f| f == flag));
        }
        prop_assert_eq!(patch_cflags_line(&once, &INCLUDE_CFLAGS, &EXCLUDE_CFLAGS), once);
    }

    #[test]
    fn version_replacement_keeps_prefix_and_suffix(
        prefix in "[a-z ]{0,8}",
        suffix in "[a-z\"' ]{0,8}",
        old in (0u32..100, 0u32..100, 0u32..1000),
    ) {
        let version = Version::parse("2.0.0").unwrap();
        let targets = [Target {
            file: "build.env".to_string(),
            separator: LineSeparator::Lf,
            patterns: vec![Regex::new(r"VERSION=(?P<version>\d+\.\d+\.\d+)").unwrap()],
        }];
        let updater = VersionUpdater::new(&version, &targets);

        let line = format!("{prefix}VERSION={}.{}.{}{suffix}", old.0, old.1, old.2);
        let edit = updater.apply_line(&targets[0], &line).unwrap();
        prop_assert_eq!(edit.text, format!("{prefix}VERSION=2.0.0{suffix}"));
    }

    #[test]
    fn android_transform_keeps_line_count(lines in prop::collection::vec("[ -~]{0,40}", 0..10)) {
        let source = lines.join("\n");
        prop_assert_eq!(
            transform_source(&source).split('\n').count(),
            source.split('\n').count()
        );
    }
}
