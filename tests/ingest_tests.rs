//! Bulk load dispatch tests
//!
//! Lines go through the splitter and text conversion before routing; the
//! segment must match routing the same values directly.

use bytes::Bytes;
use luma_distribution::ingest::{LineSplitter, ParseMode, RowDispatcher};
use luma_distribution::policy::{AttributeDesc, DistributionPolicy, MemoryCatalog, TupleDesc};
use luma_distribution::types::oid::*;
use luma_distribution::{Datum, RouteError, RouterConfig, RouterContext, SegmentGuard};

const CONFIG: &str = r#"
num_segments = 6
round_robin_seed = 3

[ingest]
delimiter = "|"
null_marker = ""
"#;

fn orders() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.add_relation(
        1,
        TupleDesc::new(vec![
            AttributeDesc::new("order_id", INT8OID),
            AttributeDesc::new("placed", DATEOID),
            AttributeDesc::new("note", TEXTOID),
            AttributeDesc::new("client", INETOID),
        ]),
        Some(DistributionPolicy::hashed(vec![4, 1]).unwrap()),
    );
    catalog
}

/// Show `debug!`/`warn!` output under `RUST_LOG` when a test fails.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dispatcher<'a>(
    catalog: &'a MemoryCatalog,
    config: &RouterConfig,
    columns: Vec<u16>,
    mode: ParseMode,
) -> RowDispatcher<'a> {
    let ctx = RouterContext::new(catalog, 1, config).unwrap();
    let splitter = LineSplitter::from_config(&config.ingest).unwrap();
    RowDispatcher::new(ctx, splitter, columns, mode).unwrap()
}

#[cfg(test)]
mod dispatch_tests {
    use super::*;

    #[test]
    fn test_text_matches_typed_routing() {
        init_tracing();
        let catalog = orders();
        let config = RouterConfig::from_toml_str(CONFIG).unwrap();
        let mut d = dispatcher(&catalog, &config, vec![1, 2, 3, 4], ParseMode::DispatchOnly);
        assert_eq!(d.parse_bound(), Some(4));

        let mut ctx = RouterContext::new(&catalog, 1, &config).unwrap();
        for id in 0..50i64 {
            let line = format!("{}|2024-02-29|note {}|10.1.{}.7\n", id, id, id);
            let routed = d.dispatch(Bytes::from(line)).unwrap();

            let expected = ctx
                .route(&[
                    Some(Datum::Int8(id)),
                    None,
                    None,
                    Some(Datum::Inet(luma_distribution::types::Inet::v4(
                        [10, 1, id as u8, 7],
                        32,
                    ))),
                ])
                .unwrap();
            assert_eq!(routed.segment, expected);
        }
        assert_eq!(d.context().stats().rows_routed, 50);
    }

    #[test]
    fn test_reordered_columns_parse_less() {
        let catalog = orders();
        let config = RouterConfig::from_toml_str(CONFIG).unwrap();
        let mut d = dispatcher(&catalog, &config, vec![4, 1, 3, 2], ParseMode::DispatchOnly);
        assert_eq!(d.parse_bound(), Some(2));

        // the trailing fields are never converted, so a bad date goes unnoticed
        let row = d
            .dispatch(Bytes::from_static(b"192.168.0.1|17|x|not-a-date"))
            .unwrap();
        assert_eq!(row.parsed_fields, 2);

        let mut full = dispatcher(&catalog, &config, vec![4, 1, 3, 2], ParseMode::Full);
        let same = full
            .dispatch(Bytes::from_static(b"192.168.0.1|17|x|not-a-date"))
            .unwrap();
        assert_eq!(same.segment, row.segment);
    }

    #[test]
    fn test_empty_field_is_null_key() {
        let catalog = orders();
        let config = RouterConfig::from_toml_str(CONFIG).unwrap();
        let mut d = dispatcher(&catalog, &config, vec![1, 4], ParseMode::Full);
        let line = d.dispatch(Bytes::from_static(b"|")).unwrap();

        let mut ctx = RouterContext::new(&catalog, 1, &config).unwrap();
        assert_eq!(line.segment, ctx.route(&[None, None, None, None]).unwrap());
    }

    #[test]
    fn test_omitted_key_column_routes_as_null() {
        let catalog = orders();
        let config = RouterConfig::from_toml_str(CONFIG).unwrap();
        let mut d = dispatcher(&catalog, &config, vec![1, 2], ParseMode::DispatchOnly);
        let row = d.dispatch(Bytes::from_static(b"5|2024-01-01")).unwrap();
        assert_eq!(row.parsed_fields, 1);

        let mut ctx = RouterContext::new(&catalog, 1, &config).unwrap();
        assert_eq!(
            row.segment,
            ctx.route(&[Some(Datum::Int8(5)), None, None, None]).unwrap()
        );
    }

    #[test]
    fn test_bad_address_is_rejected() {
        let catalog = orders();
        let config = RouterConfig::from_toml_str(CONFIG).unwrap();
        let mut d = dispatcher(&catalog, &config, vec![1, 4], ParseMode::DispatchOnly);
        assert!(matches!(
            d.dispatch(Bytes::from_static(b"1|300.0.0.1")),
            Err(RouteError::InvalidInput { .. })
        ));
    }
}

#[cfg(test)]
mod segment_check_tests {
    use super::*;

    #[test]
    fn test_local_load_rejects_foreign_rows() {
        init_tracing();
        let catalog = orders();
        let config = RouterConfig {
            local_segment: Some(0),
            ..RouterConfig::from_toml_str(CONFIG).unwrap()
        };
        let guard = SegmentGuard::from_config(&config).unwrap().unwrap();
        let mut ctx = RouterContext::new(&catalog, 1, &config).unwrap();

        let mut accepted = 0;
        let mut rejected = 0;
        for id in 0..60i64 {
            let row = [Some(Datum::Int8(id)), None, None, None];
            match guard.check(&mut ctx, &row) {
                Ok(Some(0)) => accepted += 1,
                Err(RouteError::WrongSegment { local: 0, target }) => {
                    assert_ne!(target, 0);
                    rejected += 1;
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(accepted + rejected, 60);
        assert_eq!(ctx.stats().wrong_segment, rejected);
    }
}

#[cfg(test)]
mod inet_family_tests {
    use super::*;
    use luma_distribution::types::Inet;

    fn odd_client(id: i64) -> [Option<Datum>; 4] {
        let mut client = Inet::v4([10, 0, 0, 1], 32);
        client.family = 42;
        [Some(Datum::Int8(id)), None, None, Some(Datum::Inet(client))]
    }

    #[test]
    fn test_unknown_family_is_counted_by_default() {
        init_tracing();
        let catalog = orders();
        let config = RouterConfig::from_toml_str(CONFIG).unwrap();
        assert!(!config.strict_inet_family);
        let mut ctx = RouterContext::new(&catalog, 1, &config).unwrap();

        for id in 0..3 {
            assert!(ctx.route(&odd_client(id)).unwrap() < 6);
        }
        assert_eq!(ctx.stats().bad_inet_family, 3);
        assert_eq!(ctx.stats().rows_routed, 3);
    }

    #[test]
    fn test_strict_config_rejects_unknown_family() {
        init_tracing();
        let catalog = orders();
        let config = RouterConfig::from_toml_str(&format!("strict_inet_family = true\n{}", CONFIG)).unwrap();
        assert!(config.strict_inet_family);
        let mut ctx = RouterContext::new(&catalog, 1, &config).unwrap();

        assert_eq!(ctx.route(&odd_client(7)), Err(RouteError::BadNetworkAddressFamily(42)));
        assert_eq!(ctx.stats().rows_routed, 0);
        assert_eq!(ctx.stats().bad_inet_family, 0);

        // well-formed addresses still route
        let row = [Some(Datum::Int8(7)), None, None, Some(Datum::Inet(Inet::v4([10, 0, 0, 1], 32)))];
        assert!(ctx.route(&row).unwrap() < 6);
    }
}
