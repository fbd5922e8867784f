use proptest::prelude::*;
use trackfig_core::chrom::resolve_chrom;
use trackfig_core::Region;

proptest! {
    #[test]
    fn parse_display_roundtrip(chrom in "(chr)?[0-9XYM]{1,2}", start in 0u64..1_000_000_000, len in 1u64..10_000_000) {
        let region = Region::new(chrom.clone(), start, start + len).unwrap();
        let parsed = Region::parse(&region.to_string()).unwrap();
        prop_assert_eq!(parsed, region);
    }

    #[test]
    fn thousands_separators_ignored(start in 0u64..1_000_000, len in 1u64..1_000_000) {
        let end = start + len;
        let with_commas = |n: u64| {
            let digits = n.to_string();
            let mut out = String::new();
            for (i, c) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    out.push(',');
                }
                out.push(c);
            }
            out
        };
        let text = format!("chr2:{}-{}", with_commas(start), with_commas(end));
        let region = Region::parse(&text).unwrap();
        prop_assert_eq!((region.start, region.end), (start, end));
    }

    #[test]
    fn reversed_ranges_rejected(start in 1u64..1_000_000, back in 0u64..1_000) {
        let end = start.saturating_sub(back);
        let text = format!("chr1:{}-{}", start, end);
        prop_assert!(Region::parse(&text).is_err());
    }

    #[test]
    fn chr_prefix_toggles(n in 1u32..30) {
        let ucsc = format!("chr{}", n);
        let ensembl = n.to_string();
        prop_assert_eq!(resolve_chrom(&ensembl, |c| c == ucsc), Some(ucsc.clone()));
        prop_assert_eq!(resolve_chrom(&ucsc, |c| c == ensembl), Some(ensembl.clone()));
    }
}
