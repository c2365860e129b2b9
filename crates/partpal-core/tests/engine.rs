mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use partpal_core::{
    Distributor, Engine, EngineConfig, EngineError, ExecutionMode, LineItem, PricedBom,
};
use common::{DownDistributor, StubDistributor};

fn engine(distributors: Vec<Arc<dyn Distributor>>, mode: ExecutionMode) -> Engine {
    Engine::with_config(
        distributors,
        EngineConfig {
            mode,
            query_timeout: Some(Duration::from_secs(5)),
        },
    )
    .unwrap()
}

fn sorted(mut bom: PricedBom) -> PricedBom {
    bom.sort_by_part_number();
    bom
}

fn recomputed_total(bom: &PricedBom) -> f64 {
    bom.components
        .iter()
        .fold(0.0, |acc, o| acc + o.unit_price * f64::from(o.quantity))
}

const MODES: [ExecutionMode; 2] = [ExecutionMode::Sequential, ExecutionMode::Concurrent];

#[test]
fn test_single_distributor_answers() {
    for mode in MODES {
        let a = StubDistributor::new("A").price("R1", 0.05).shared();
        let b: Arc<dyn Distributor> = Arc::new(DownDistributor("B"));
        let bom = vec![LineItem::new("R1", Some("10k".into()), 10)];

        let priced = engine(vec![a, b], mode).price(&bom).unwrap();

        assert_eq!(priced.len(), 1);
        let offer = &priced.components[0];
        assert_eq!(offer.unit_price, 0.05);
        assert_eq!(offer.quantity, 10);
        assert_eq!(offer.distributor.as_deref(), Some("A"));
        assert!((priced.total_cost - 0.50).abs() < 1e-12, "{mode}: {}", priced.total_cost);
    }
}

#[test]
fn test_all_distributors_fail() {
    for mode in MODES {
        let a: Arc<dyn Distributor> = Arc::new(DownDistributor("A"));
        let b: Arc<dyn Distributor> = Arc::new(DownDistributor("B"));
        let bom = vec![LineItem::new("C1", Some("100nF".into()), 5)];

        let priced = engine(vec![a, b], mode).price(&bom).unwrap();

        assert_eq!(priced.len(), 1);
        let offer = &priced.components[0];
        assert_eq!(offer.part_number, "C1");
        assert_eq!(offer.description, "100nF");
        assert_eq!(offer.quantity, 5);
        assert_eq!(offer.unit_price, 0.0);
        assert_eq!(priced.total_cost, 0.0);
        assert_eq!(priced.unsourced().count(), 1);
    }
}

#[test]
fn test_cheaper_distributor_wins() {
    for mode in MODES {
        let a = StubDistributor::new("A").price("U1", 1.20).shared();
        let b = StubDistributor::new("B").price("U1", 0.95).shared();
        let bom = vec![LineItem::new("U1", None, 2)];

        let priced = engine(vec![a, b], mode).price(&bom).unwrap();

        assert_eq!(priced.components[0].unit_price, 0.95);
        assert_eq!(priced.components[0].part_number, "B-U1");
        assert!((priced.total_cost - 1.90).abs() < 1e-12);
    }
}

#[test]
fn test_selected_price_is_minimal() {
    let distributors: Vec<Arc<dyn Distributor>> = vec![
        StubDistributor::new("A")
            .price("R1", 0.10)
            .price("C1", 0.02)
            .price("U1", 3.00)
            .shared(),
        StubDistributor::new("B")
            .price("R1", 0.08)
            .price("U1", 3.50)
            .shared(),
        Arc::new(DownDistributor("C")),
        StubDistributor::new("D")
            .price("C1", 0.03)
            .price("U1", 2.75)
            .shared(),
    ];
    let bom = vec![
        LineItem::new("R1", None, 100),
        LineItem::new("C1", None, 50),
        LineItem::new("U1", None, 1),
    ];

    for mode in MODES {
        let priced = engine(distributors.clone(), mode).price(&bom).unwrap();
        for offer in &priced.components {
            let candidates: Vec<f64> = distributors
                .iter()
                .filter_map(|d| d.query_part_number(&offer.manufacturer_part_number).ok())
                .map(|o| o.unit_price)
                .collect();
            assert!(!candidates.is_empty());
            assert!(
                candidates.iter().all(|p| offer.unit_price <= *p),
                "{mode}: {} priced {} but candidates were {candidates:?}",
                offer.part_number,
                offer.unit_price
            );
        }
    }
}

#[test]
fn test_tie_goes_to_first_distributor() {
    for mode in MODES {
        for _ in 0..10 {
            // The first distributor answers last, so arrival order disagrees with list order
            let a = StubDistributor::new("A")
                .price("R1", 0.25)
                .delay(Duration::from_millis(20))
                .shared();
            let b = StubDistributor::new("B").price("R1", 0.25).shared();
            let bom = vec![LineItem::new("R1", None, 4)];

            let priced = engine(vec![a, b], mode).price(&bom).unwrap();
            assert_eq!(priced.components[0].distributor.as_deref(), Some("A"), "{mode}");
        }
    }
}

#[test]
fn test_total_matches_components() {
    let distributors: Vec<Arc<dyn Distributor>> = vec![
        StubDistributor::new("A")
            .price("R1", 0.013)
            .price("R2", 0.021)
            .shared(),
        StubDistributor::new("B")
            .price("R2", 0.017)
            .price("U7", 4.87)
            .shared(),
    ];
    let bom = vec![
        LineItem::new("R1", None, 37),
        LineItem::new("R2", None, 11),
        LineItem::new("U7", None, 3),
        LineItem::new("J9", None, 2),
    ];

    for mode in MODES {
        let priced = engine(distributors.clone(), mode).price(&bom).unwrap();
        assert_eq!(priced.total_cost, recomputed_total(&priced), "{mode}");
    }
}

#[test]
fn test_sequential_and_concurrent_agree() {
    let distributors: Vec<Arc<dyn Distributor>> = vec![
        StubDistributor::new("A")
            .price("R1", 0.25)
            .price("C1", 0.125)
            .price("U1", 2.5)
            .delay(Duration::from_millis(5))
            .shared(),
        StubDistributor::new("B")
            .price("R1", 0.5)
            .price("U1", 1.5)
            .price("L1", 0.75)
            .shared(),
        Arc::new(DownDistributor("C")),
    ];
    let bom: Vec<LineItem> = ["R1", "C1", "U1", "L1", "D1"]
        .iter()
        .enumerate()
        .map(|(i, pn)| LineItem::new(*pn, None, (i as u32 + 1) * 4))
        .collect();

    let sequential = engine(distributors.clone(), ExecutionMode::Sequential)
        .price(&bom)
        .unwrap();
    let concurrent = engine(distributors, ExecutionMode::Concurrent)
        .price(&bom)
        .unwrap();

    assert_eq!(sequential.total_cost, concurrent.total_cost);
    assert_eq!(sorted(sequential).components, sorted(concurrent).components);
}

#[test]
fn test_sequential_preserves_input_order() {
    let a = StubDistributor::new("A")
        .price("U3", 1.0)
        .price("U1", 1.0)
        .shared();
    let bom = vec![
        LineItem::new("U3", None, 1),
        LineItem::new("X9", None, 1),
        LineItem::new("U1", None, 1),
    ];

    let priced = engine(vec![a], ExecutionMode::Sequential)
        .price(&bom)
        .unwrap();
    let order: Vec<_> = priced
        .components
        .iter()
        .map(|o| o.part_number.as_str())
        .collect();
    assert_eq!(order, vec!["A-U3", "X9", "A-U1"]);
}

#[test]
fn test_every_distributor_queried_once_per_line_item() {
    for mode in MODES {
        let a = Arc::new(StubDistributor::new("A").price("R1", 0.5));
        let b = Arc::new(StubDistributor::new("B"));
        let distributors: Vec<Arc<dyn Distributor>> =
            vec![a.clone() as Arc<dyn Distributor>, b.clone()];
        let bom = vec![
            LineItem::new("R1", None, 1),
            LineItem::new("R2", None, 1),
            LineItem::new("R3", None, 1),
        ];

        engine(distributors, mode).price(&bom).unwrap();

        assert_eq!(a.calls(), 3, "{mode}");
        assert_eq!(b.calls(), 3, "{mode}");
    }
}

#[test]
fn test_hung_distributor_times_out() {
    let slow = StubDistributor::new("Slow")
        .price("R1", 0.01)
        .delay(Duration::from_secs(5))
        .shared();
    let fast = StubDistributor::new("Fast").price("R1", 0.02).shared();
    let engine = Engine::with_config(
        vec![slow, fast],
        EngineConfig {
            mode: ExecutionMode::Concurrent,
            query_timeout: Some(Duration::from_millis(200)),
        },
    )
    .unwrap();

    let start = Instant::now();
    let priced = engine.price(&[LineItem::new("R1", None, 1)]).unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(priced.components[0].distributor.as_deref(), Some("Fast"));
    assert_eq!(priced.components[0].unit_price, 0.02);
}

#[test]
fn test_empty_bom_prices_to_nothing() {
    for mode in MODES {
        let a = StubDistributor::new("A").shared();
        let priced = engine(vec![a], mode).price(&[]).unwrap();
        assert!(priced.is_empty());
        assert_eq!(priced.total_cost, 0.0);
    }
}

#[test]
fn test_no_distributors_is_a_configuration_error() {
    assert!(matches!(
        Engine::new(Vec::new()),
        Err(EngineError::NoDistributors)
    ));
}

#[test]
fn test_uninitialized_distributor_is_rejected() {
    let a = StubDistributor::new("A").shared();
    let b = StubDistributor::new("B").uninitialized().shared();
    match Engine::new(vec![a, b]) {
        Err(EngineError::Uninitialized(name)) => assert_eq!(name, "B"),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("engine accepted an uninitialized distributor"),
    }
}

#[test]
fn test_malformed_line_item_is_rejected() {
    for mode in MODES {
        let a = StubDistributor::new("A").shared();
        let bom = vec![LineItem::new("R1", None, 1), LineItem::new("", None, 1)];
        let err = engine(vec![a], mode).price(&bom).unwrap_err();
        assert!(matches!(err, EngineError::MalformedLineItem { index: 1, .. }));
    }
}
