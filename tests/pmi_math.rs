use event_assoc::signals::pmi;

#[test]
fn discounted_pmi_matches_reference() {
    let value = pmi::discounted_pmi(1.0, 1_000_000.0, 100_000.0, 100_000.0, 2_000_000.0);
    let expected = (1e-6f64 / 0.0025).ln() * (100_000.0 / 100_010.0);
    assert!((value - expected).abs() < 1e-9);
    assert!(value < 0.0);
}

#[test]
fn discount_grows_with_the_rarer_token() {
    assert!(pmi::discount(5.0, 1_000.0) < pmi::discount(50.0, 1_000.0));
    assert_eq!(pmi::discount(10.0, 10.0), 0.5);
}
