//! Integration tests for layout, collapsing, and viewport culling

use std::collections::{BTreeMap, HashSet};

use orgchart_engine::layout::{self, lint, LayoutNode, VisibleLayout};
use orgchart_engine::{
    chart_grid, CollapseState, EmployeeId, EngineConfig, Grid, LayoutConfig, LayoutResult,
    OrgForest, OrganizationId, Viewport,
};
use pretty_assertions::assert_eq;

/// CEO with three VPs, each VP with six reports
fn company_grid() -> Grid {
    let mut rows = vec![vec!["Name".to_string(), "Manager".to_string()]];
    rows.push(vec!["CEO".to_string(), String::new()]);
    for vp in ["Ann", "Bea", "Cal"] {
        rows.push(vec![format!("VP {}", vp), "CEO".to_string()]);
        for i in 0..6 {
            rows.push(vec![format!("{} Report {}", vp, i), format!("VP {}", vp)]);
        }
    }
    Grid::from_strings(rows)
}

/// CEO with six directors; the first-row directors run teams of their own
fn deep_fan_out_grid() -> Grid {
    let rows = vec![
        vec!["Name", "Manager"],
        vec!["CEO", ""],
        vec!["Dir North", "CEO"],
        vec!["Dir South", "CEO"],
        vec!["Dir East", "CEO"],
        vec!["Dir West", "CEO"],
        vec!["Dir Labs", "CEO"],
        vec!["Dir Legal", "CEO"],
        vec!["North Lead", "Dir North"],
        vec!["South Lead", "Dir South"],
        vec!["South Analyst", "South Lead"],
        vec!["East Lead", "Dir East"],
        vec!["East Planner", "Dir East"],
        vec!["West Lead", "Dir West"],
        vec!["Labs Lead", "Dir Labs"],
    ];
    Grid::from_strings(rows)
}

fn full_layout(config: &EngineConfig) -> (orgchart_engine::Chart, LayoutResult) {
    let chart = chart_grid(&company_grid(), OrganizationId::generate(), config)
        .expect("Should chart");
    let forest = OrgForest::new(&chart.resolved.employees);
    let result = layout::compute(&forest, &CollapseState::new(), &config.layout)
        .expect("Should lay out");
    (chart, result)
}

#[test]
fn test_layout_is_deterministic() {
    let config = EngineConfig::default();
    let chart = chart_grid(&company_grid(), OrganizationId::generate(), &config)
        .expect("Should chart");
    let forest = OrgForest::new(&chart.resolved.employees);

    let first = layout::compute(&forest, &CollapseState::new(), &config.layout).unwrap();
    let second = layout::compute(&forest, &CollapseState::new(), &config.layout).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_same_row_siblings_do_not_overlap() {
    let (_, result) = full_layout(&EngineConfig::default());
    assert_eq!(result.nodes.len(), 22);

    let mut rows: BTreeMap<(Option<EmployeeId>, usize), Vec<(f64, f64)>> = BTreeMap::new();
    for node in &result.nodes {
        rows.entry((node.parent, node.row))
            .or_default()
            .push(node.subtree_extent());
    }
    for extents in rows.values_mut() {
        extents.sort_by(|a, b| a.0.total_cmp(&b.0));
        for pair in extents.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "extents overlap: {:?}", pair);
        }
    }

    let warnings = lint::check(&result);
    assert!(warnings.is_empty(), "lint warnings: {:?}", warnings);
}

#[test]
fn test_wrapped_reports_use_extra_levels() {
    let (chart, result) = full_layout(&EngineConfig::default());
    let vp = result
        .node(&chart.resolved.id_of("VP Ann").unwrap())
        .unwrap();
    let wrapped = result
        .node(&chart.resolved.id_of("Ann Report 5").unwrap())
        .unwrap();

    assert_eq!(vp.subtree_width, 860.0);
    assert_eq!(vp.subtree_levels, 3);
    assert_eq!(wrapped.row, 1);
    assert_eq!(wrapped.y - vp.y, 300.0);

    let ceo = result.node(&chart.resolved.id_of("CEO").unwrap()).unwrap();
    assert_eq!(ceo.subtree_width, 3.0 * 860.0 + 2.0 * 20.0);
    assert_eq!(ceo.subtree_levels, 4);
}

#[test]
fn test_large_hierarchy_starts_collapsed() {
    let config = EngineConfig::new().with_layout(LayoutConfig::new().with_large_hierarchy_threshold(10));
    let chart = chart_grid(&company_grid(), OrganizationId::generate(), &config)
        .expect("Should chart");

    assert_eq!(chart.layout.nodes.len(), 1);
    assert!(chart.layout.nodes[0].collapsed);
    assert!(chart.layout.connectors.is_empty());

    let forest = OrgForest::new(&chart.resolved.employees);
    let mut collapsed = CollapseState::initial(&forest, 10);
    collapsed.reveal(&forest, &chart.resolved.id_of("Bea Report 2").unwrap());
    let result = layout::compute(&forest, &collapsed, &config.layout).unwrap();

    // CEO, three VPs, and VP Bea's six reports
    assert_eq!(result.nodes.len(), 10);
}

#[test]
fn test_cull_keeps_only_visible_nodes() {
    let config = EngineConfig::new().with_layout(LayoutConfig::new().with_viewport_buffer(0.0));
    let (_, result) = full_layout(&config);

    let viewport = Viewport::new(800.0, 400.0);
    let VisibleLayout {
        nodes,
        connectors,
        area,
    } = layout::cull(&result, &viewport, &config.layout).expect("Should cull");

    assert!(!nodes.is_empty());
    assert!(nodes.len() < result.nodes.len());
    assert!(nodes.iter().all(|n| n.bounds().intersects(&area)));

    let visible: HashSet<EmployeeId> = nodes.iter().map(|n| n.id).collect();
    let expected = result
        .connectors
        .iter()
        .filter(|c| visible.contains(&c.from) || visible.contains(&c.to))
        .count();
    assert_eq!(connectors.len(), expected);
}

#[test]
fn test_cull_follows_pan_and_zoom() {
    let config = EngineConfig::default();
    let (_, result) = full_layout(&config);

    let everything = Viewport::new(800.0, 600.0).with_zoom(0.1);
    let visible = layout::cull(&result, &everything, &config.layout).unwrap();
    assert_eq!(visible.nodes.len(), result.nodes.len());

    let far_away = Viewport::new(800.0, 600.0).with_pan(-100_000.0, 0.0);
    let visible = layout::cull(&result, &far_away, &config.layout).unwrap();
    assert!(visible.nodes.is_empty());
    assert!(visible.connectors.is_empty());
}

#[test]
fn test_wrapped_row_sits_below_deep_first_row() {
    let config = EngineConfig::default();
    let chart = chart_grid(&deep_fan_out_grid(), OrganizationId::generate(), &config)
        .expect("Should chart");
    let result = &chart.layout;
    let level_height = config.layout.level_height;
    assert_eq!(result.nodes.len(), 14);

    let ceo = result.node(&chart.resolved.id_of("CEO").unwrap()).unwrap();
    assert_eq!(ceo.subtree_levels, 6);

    let mut rows: BTreeMap<usize, Vec<&LayoutNode>> = BTreeMap::new();
    for node in result.nodes.iter().filter(|n| n.parent == Some(ceo.id)) {
        rows.entry(node.row).or_default().push(node);
    }
    assert_eq!(rows.len(), 2);
    let first_row_bottom = rows[&0]
        .iter()
        .map(|n| n.y + n.subtree_levels as f64 * level_height)
        .fold(f64::MIN, f64::max);
    for wrapped in &rows[&1] {
        assert_eq!(wrapped.level, 1);
        assert_eq!(wrapped.y, first_row_bottom);
    }

    let analyst = result
        .node(&chart.resolved.id_of("South Analyst").unwrap())
        .unwrap();
    let labs_lead = result.node(&chart.resolved.id_of("Labs Lead").unwrap()).unwrap();
    assert!(labs_lead.y > analyst.y + config.layout.node_height);

    let warnings = lint::check(result);
    assert!(warnings.is_empty(), "lint warnings: {:?}", warnings);
}
