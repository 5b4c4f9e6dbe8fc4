use dexbench::domain::{
    BenchmarkReport, BenchmarkResult, BenchmarkSuccess, Emulation, ProviderRef, Route,
    RouteRequest, Token,
};
use dexbench::engine::{lowest_route_build_time, measure_report, most_profitable_all};
use dexbench::providers::ProviderExtra;

fn result(provider: &str, is_dex: bool, symbol: &str, ratio: f64, elapsed: f64) -> BenchmarkResult {
    let request = RouteRequest {
        input_token: Token::native(),
        output_token: Token::new(format!("EQ{}", symbol), symbol, 9),
        input_amount: 1_000_000_000_000,
        max_splits: 4,
        max_length: 5,
    };
    BenchmarkResult::Success(Box::new(BenchmarkSuccess {
        route: Route::for_request(&request, provider, 0, ProviderExtra::None),
        elapsed,
        emulation_elapsed: 0.0,
        ratio,
        provider: ProviderRef::new(provider, is_dex),
        emulation: Emulation::Unsupported,
    }))
}

#[test]
fn test_exactly_one_winner_among_three() {
    let results = vec![
        result("x", false, "USDT", 0.98, 1.0),
        result("y", false, "USDT", 1.00, 1.0),
        result("z", false, "USDT", 0.95, 1.0),
    ];

    let winners: Vec<_> = ["x", "y", "z"]
        .into_iter()
        .filter(|p| most_profitable_all(&results, p).hits == 1)
        .collect();
    assert_eq!(winners, vec!["y"]);
    assert_eq!(most_profitable_all(&results, "y").total, 1);
}

#[test]
fn test_within_threshold_is_a_hit() {
    let results = vec![
        result("x", false, "USDT", 1.0, 1.0),
        result("y", false, "USDT", 0.99991, 1.0),
    ];
    assert_eq!(most_profitable_all(&results, "y").hits, 1);
}

#[test]
fn test_speed_ranking_among_aggregators_only() {
    let results = vec![
        result("stonfi", true, "USDT", 1.0, 0.05),
        result("swap.coffee", false, "USDT", 1.0, 0.30),
        result("rainbow.ag", false, "USDT", 1.0, 0.60),
        result("swap.coffee", false, "NOT", 1.0, 0.90),
        result("rainbow.ag", false, "NOT", 1.0, 0.40),
    ];
    let coffee = lowest_route_build_time(&results, "swap.coffee", false);
    assert_eq!((coffee.total, coffee.hits), (2, 1));
    assert!(coffee.symbols.contains("USDT"));
    assert_eq!(lowest_route_build_time(&results, "stonfi", false).hits, 0);
}

#[test]
fn test_report_stats_per_size() {
    let mut report = BenchmarkReport::default();
    report.push(
        100,
        vec![
            result("swap.coffee", false, "USDT", 1.0, 0.5),
            result("rainbow.ag", false, "USDT", 0.9, 0.25),
        ],
    );
    report.push(1000, vec![result("rainbow.ag", false, "USDT", 1.0, 1.5)]);

    let groups = measure_report(&report);
    assert_eq!(groups.iter().map(|g| g.input_amount).collect::<Vec<_>>(), vec![100, 1000]);

    let coffee = &groups[0].stats[0];
    assert_eq!(coffee.provider_name, "swap.coffee");
    assert_eq!((coffee.profitable_hit, coffee.fast_hit_aggregators), (1, 0));
    assert_eq!(coffee.avg_elapsed, 0.5);

    let rainbow_large = &groups[1].stats[1];
    assert_eq!(rainbow_large.provider_name, "rainbow.ag");
    assert_eq!(rainbow_large.profitable_hit, 1);
    assert_eq!(groups[1].stats[0].avg_elapsed, 0.0);
}
