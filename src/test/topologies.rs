use crate::error::PerfError;
use crate::topo::{
    BuildOption, BuildOptionState, LINK_BANDWIDTH_MBPS, NodeKind, SWITCH_NAME,
    build_single_switch,
};

#[test]
fn single_switch_default_has_plain_gigabit_links() {
    let state = BuildOptionState::new();
    let topo = build_single_switch(2, &state).expect("build");

    let switches: Vec<_> = topo.switches().map(|n| n.name.as_str()).collect();
    let hosts: Vec<_> = topo.hosts().map(|n| n.name.as_str()).collect();
    assert_eq!(switches, [SWITCH_NAME]);
    assert_eq!(hosts, ["h1", "h2"]);
    assert_eq!(topo.links().len(), 2);

    for link in topo.links() {
        assert_eq!(link.bandwidth_mbps, LINK_BANDWIDTH_MBPS);
        assert!(!link.is_impaired(), "unexpected impairment: {link:?}");
        assert_eq!(topo.node(link.b).kind, NodeKind::Switch);
    }
    assert_eq!(topo.node(topo.links()[0].a).name, "h1");
    assert_eq!(topo.node(topo.links()[1].a).name, "h2");
}

#[test]
fn single_switch_loss_applies_to_first_link_only() {
    let mut state = BuildOptionState::new();
    state.select(BuildOption::Loss(3));
    let topo = build_single_switch(2, &state).expect("build");

    let links = topo.links();
    assert_eq!(links[0].loss_percent, Some(3));
    assert_eq!(links[0].delay_ms, None);
    assert!(!links[1].is_impaired(), "second link must stay clean: {:?}", links[1]);
}

#[test]
fn single_switch_delay_applies_to_first_link_only() {
    let mut state = BuildOptionState::new();
    state.select(BuildOption::Delay(41));
    let topo = build_single_switch(2, &state).expect("build");

    let links = topo.links();
    assert_eq!(links[0].delay_ms, Some(41));
    assert_eq!(links[0].loss_percent, None);
    assert!(!links[1].is_impaired());
}

#[test]
fn single_switch_zero_magnitude_means_no_impairment() {
    let mut state = BuildOptionState::new();
    state.select(BuildOption::Loss(0));
    let topo = build_single_switch(2, &state).expect("build");
    assert!(topo.links().iter().all(|l| !l.is_impaired()));
}

#[test]
fn single_switch_rejects_other_host_counts_under_impairment() {
    let mut state = BuildOptionState::new();
    state.select(BuildOption::Delay(10));
    for n in [1, 3, 4] {
        let err = build_single_switch(n, &state).expect_err("only 2 hosts supported");
        assert!(matches!(err, PerfError::InvalidArgument(_)), "n={n}: {err}");
    }
}

#[test]
fn single_switch_default_allows_more_hosts_but_not_zero() {
    let state = BuildOptionState::new();
    let topo = build_single_switch(4, &state).expect("build");
    let hosts: Vec<_> = topo.hosts().map(|n| n.name.clone()).collect();
    assert_eq!(hosts, ["h1", "h2", "h3", "h4"]);
    assert!(topo.links().iter().all(|l| !l.is_impaired()));

    assert!(matches!(
        build_single_switch(0, &state),
        Err(PerfError::InvalidArgument(_))
    ));
}
