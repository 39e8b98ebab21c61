//! Cross-parser behaviour of the coverage model.
//!
//! Each test states one property that must hold for every profile format.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use proptest::prelude::*;

mod stat_tests {
    use super::*;

    #[test]
    fn test_percent_rounds_to_one_decimal() {
        assert_eq!(CoverageStat::new(1, 3).percent(), 33.3);
        assert_eq!(CoverageStat::new(2, 3).percent(), 66.7);
        assert_eq!(CoverageStat::new(4, 5).percent(), 80.0);
    }

    #[test]
    fn test_percent_of_empty_stat_is_zero() {
        assert_eq!(CoverageStat::default().percent(), 0.0);
        assert!(CoverageStat::default().is_empty());
    }

    #[test]
    fn test_new_clamps_covered() {
        let stat = CoverageStat::new(9, 4);
        assert_eq!(stat.covered, 4);
        assert_eq!(stat.total, 4);
    }

    #[test]
    fn test_merge_policies() {
        let a = CoverageStat::new(1, 2);
        let b = CoverageStat::new(2, 2);
        assert_eq!(a.merged(b, MergePolicy::Max), CoverageStat::new(2, 2));
        assert_eq!(a.merged(b, MergePolicy::Sum), CoverageStat::new(3, 4));
    }

    #[test]
    fn test_total_of() {
        let stats = [CoverageStat::new(1, 2), CoverageStat::new(3, 8)];
        assert_eq!(total_of(&stats), CoverageStat::new(4, 10));
    }

    #[test]
    fn test_display() {
        assert_eq!(CoverageStat::new(1, 4).to_string(), "1/4 (25.0%)");
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(80.44), 80.4);
        assert_eq!(round1(-0.04), -0.0);
    }
}

mod format_tests {
    use super::*;

    #[test]
    fn test_format_round_trip_names() {
        for format in ProfileFormat::ALL {
            assert_eq!(format.as_str().parse::<ProfileFormat>().unwrap(), format);
        }
        assert!("clover".parse::<ProfileFormat>().is_err());
    }

    #[test]
    fn test_format_serde_lowercase() {
        let json = serde_json::to_string(&ProfileFormat::Cobertura).unwrap();
        assert_eq!(json, "\"cobertura\"");
    }
}

mod merge_tests {
    use super::*;

    #[test]
    fn test_lcov_profiles_merge_by_max() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("first.info");
        let b = dir.path().join("second.info");
        std::fs::write(&a, "SF:pkg/x.go\nDA:1,1\nDA:2,0\nend_of_record\n").unwrap();
        std::fs::write(&b, "SF:pkg/x.go\nDA:1,1\nDA:2,1\nend_of_record\n").unwrap();

        let merged = ParserRegistry::new().parse_all(&[&a, &b]).unwrap();
        assert_eq!(merged["pkg/x.go"], CoverageStat::new(2, 2));
    }

    #[test]
    fn test_cobertura_profiles_merge_by_sum() {
        let dir = tempfile::tempdir().unwrap();
        let doc = |hits: u32| {
            format!(
                r#"<coverage><packages><package><classes><class filename="m.py"><lines><line number="1" hits="{hits}"/></lines></class></classes></package></packages></coverage>"#
            )
        };
        let a = dir.path().join("a.xml");
        let b = dir.path().join("b.xml");
        std::fs::write(&a, doc(1)).unwrap();
        std::fs::write(&b, doc(0)).unwrap();

        let merged = ParserRegistry::new().parse_all(&[&a, &b]).unwrap();
        assert_eq!(merged["m.py"], CoverageStat::new(1, 2));
    }

    #[test]
    fn test_merge_into_adds_new_files() {
        let mut target = CoverageMap::new();
        target.insert("a".into(), CoverageStat::new(1, 1));
        let mut incoming = CoverageMap::new();
        incoming.insert("b".into(), CoverageStat::new(0, 3));
        merge_into(&mut target, incoming, MergePolicy::Max);
        assert_eq!(target.len(), 2);
        assert_eq!(target["b"], CoverageStat::new(0, 3));
    }
}

mod determinism_tests {
    use super::*;

    #[test]
    fn test_parsing_is_idempotent_for_each_format() {
        let samples: [(&dyn ProfileParser, &str); 4] = [
            (&NativeParser, "mode: set\na.go:1.1,2.2 2 1\nb.go:1.1,2.2 1 0\n"),
            (&LcovParser, "SF:a\nDA:1,1\nDA:2,0\nend_of_record\n"),
            (
                &CoberturaParser,
                r#"<coverage><packages><package><classes><class filename="a"><lines><line number="1" hits="1"/></lines></class></classes></package></packages></coverage>"#,
            ),
            (
                &JacocoParser,
                r#"<report name="r"><package name="p"><sourcefile name="A.java"><line nr="1" mi="1" ci="1"/></sourcefile></package></report>"#,
            ),
        ];

        for (parser, content) in samples {
            let first = parser.parse_str(content).unwrap();
            let second = parser.parse_str(content).unwrap();
            assert_eq!(first, second, "{} parsing is not deterministic", parser.format());
            assert!(!first.is_empty());
        }
    }
}

proptest! {
    #[test]
    fn prop_native_stats_respect_invariant(
        blocks in proptest::collection::vec((0u8..4, 0u64..50, 0u64..3), 0..40)
    ) {
        let mut profile = String::from("mode: set\n");
        for (i, (file, stmts, hits)) in blocks.iter().enumerate() {
            profile.push_str(&format!("f{file}.go:{i}.1,{i}.9 {stmts} {hits}\n"));
        }
        let map = NativeParser.parse_str(&profile).unwrap();
        for stat in map.values() {
            prop_assert!(stat.covered <= stat.total);
            let pct = stat.percent();
            prop_assert!((0.0..=100.0).contains(&pct));
        }
        prop_assert_eq!(map, NativeParser.parse_str(&profile).unwrap());
    }

    #[test]
    fn prop_lcov_stats_respect_invariant(
        lines in proptest::collection::vec((0u64..100, 0u64..5), 0..40),
        lf in proptest::option::of(0u64..60),
        lh in proptest::option::of(0u64..60),
    ) {
        let mut lcov = String::from("SF:x.c\n");
        for (line, hits) in &lines {
            lcov.push_str(&format!("DA:{line},{hits}\n"));
        }
        if let Some(lf) = lf {
            lcov.push_str(&format!("LF:{lf}\n"));
        }
        if let Some(lh) = lh {
            lcov.push_str(&format!("LH:{lh}\n"));
        }
        let map = LcovParser.parse_str(&lcov).unwrap();
        for stat in map.values() {
            prop_assert!(stat.covered <= stat.total);
        }
    }

    #[test]
    fn prop_merge_keeps_invariant(
        a in (0u64..100, 0u64..100),
        b in (0u64..100, 0u64..100),
    ) {
        let x = CoverageStat::new(a.0, a.1);
        let y = CoverageStat::new(b.0, b.1);
        for policy in [MergePolicy::Sum, MergePolicy::Max] {
            let m = x.merged(y, policy);
            prop_assert!(m.covered <= m.total);
        }
    }
}
