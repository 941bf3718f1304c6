#[cfg(test)]
mod tests {
    use crate::algorithms::aggregation::{
        max_real_estimate, prune_empty_shells, remove_empty_children, AggregationEngine,
        ResourceRollup,
    };
    use crate::models::calendar::{
        CalendarRegistry, ResourceCalendar, UnavailablePeriod, WeekdayMinutes,
    };
    use crate::models::macros::{BugId, CategoryId, ProjectId, ResourceId};
    use crate::models::task::{ComputeState, ScheduleStatus, ScheduleWindow, TaskForest, TaskNode};
    use crate::models::time::Timestamp;
    use crate::models::work::{MinutesKind, WorkCategorySet};
    use chrono::{TimeZone, Utc};

    /// 2026-03-02 is a Monday.
    fn at(day: u32, hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn categories() -> WorkCategorySet {
        WorkCategorySet::new(["design", "coding"])
    }

    fn calendars() -> CalendarRegistry {
        vec![
            ResourceCalendar::new(ResourceId(1), WeekdayMinutes::weekdays(480)),
            ResourceCalendar::new(ResourceId(3), WeekdayMinutes::new([0; 7])),
            ResourceCalendar::new(ResourceId(4), WeekdayMinutes::weekdays(480)).with_unavailable(
                UnavailablePeriod::new(at(3, 0), at(4, 0)).unwrap(),
            ),
        ]
        .into_iter()
        .collect()
    }

    fn bug(id: i64, handler: i64, previous: Option<i64>, estimate: i64) -> TaskNode {
        let mut node =
            TaskNode::new_bug(BugId(id), 0, None, previous.map(BugId), ResourceId(handler));
        if let Some(data) = node.bug_mut() {
            data.ledger.set(MinutesKind::Estimate, "coding", estimate);
        }
        node
    }

    fn category(id: i64, bugs: Vec<TaskNode>) -> TaskNode {
        bugs.into_iter().fold(
            TaskNode::new_category(CategoryId(id), format!("category {id}")),
            TaskNode::with_child,
        )
    }

    fn project(id: i64, categories: Vec<TaskNode>) -> TaskNode {
        categories.into_iter().fold(
            TaskNode::new_project(ProjectId(id), format!("project {id}")),
            TaskNode::with_child,
        )
    }

    fn user(id: i64, projects: Vec<TaskNode>) -> TaskNode {
        projects
            .into_iter()
            .fold(TaskNode::new_user(ResourceId(id)), TaskNode::with_child)
    }

    fn window_of(forest: &TaskForest, id: i64) -> ScheduleWindow {
        forest.find_bug(BugId(id)).and_then(|n| n.window).unwrap()
    }

    fn assert_bottom_up(node: &TaskNode) {
        if node.is_bug() {
            return;
        }
        let mut est = 0;
        let mut done = 0;
        let mut na = 0;
        let mut overdue = 0;
        for child in &node.children {
            assert_bottom_up(child);
            est += child.aggregates.est;
            done += child.aggregates.done;
            na += child.aggregates.na;
            overdue += child.aggregates.overdue;
            if let (Some(parent), Some(inner)) = (node.window, child.window) {
                assert!(parent.contains(&inner), "{} does not contain {}", node.name, child.name);
            }
        }
        assert_eq!(node.aggregates.est, est, "est of {}", node.name);
        assert_eq!(node.aggregates.done, done, "done of {}", node.name);
        assert_eq!(node.aggregates.na, na, "na of {}", node.name);
        assert_eq!(node.aggregates.overdue, overdue, "overdue of {}", node.name);
        if let Some(window) = node.window {
            assert!(window.start <= window.end);
        }
    }

    #[test]
    fn test_sibling_bugs_chain_start_dates() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut forest = TaskForest::new(vec![user(
            1,
            vec![project(
                1,
                vec![category(
                    1,
                    vec![bug(1, 1, None, 480), bug(2, 1, Some(1), 480), bug(3, 1, Some(2), 480)],
                )],
            )],
        )]);

        let summary = engine.aggregate_forest(&mut forest);
        assert_eq!(summary.projected, 3);
        assert!(summary.degraded.is_empty());

        let (w1, w2, w3) = (window_of(&forest, 1), window_of(&forest, 2), window_of(&forest, 3));
        assert_eq!(w1, ScheduleWindow::new(at(2, 0), at(3, 0)));
        assert_eq!(w2.start, w1.end);
        assert_eq!(w3.start, w2.end);
        assert_eq!(w3.end, at(5, 0));

        let root = &forest.users[0];
        assert_eq!(root.window, Some(ScheduleWindow::new(at(2, 0), at(5, 0))));
        assert_eq!(root.aggregates.est, 1440);
        assert!(root.is_computed());
    }

    #[test]
    fn test_chain_order_is_independent_of_tree_order() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        // Bug 2 comes first in the tree but is chained after bug 1.
        let mut forest = TaskForest::new(vec![user(
            1,
            vec![
                project(1, vec![category(1, vec![bug(2, 1, Some(1), 480)])]),
                project(2, vec![category(2, vec![bug(1, 1, None, 960)])]),
            ],
        )]);

        engine.aggregate_forest(&mut forest);
        assert_eq!(window_of(&forest, 1), ScheduleWindow::new(at(2, 0), at(4, 0)));
        assert_eq!(window_of(&forest, 2), ScheduleWindow::new(at(4, 0), at(5, 0)));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut forest = TaskForest::new(vec![user(
            1,
            vec![project(1, vec![category(1, vec![bug(1, 1, None, 300), bug(2, 1, Some(1), 700)])])],
        )]);

        engine.aggregate_forest(&mut forest);
        let snapshot = forest.clone();

        let second = engine.aggregate_forest(&mut forest);
        assert_eq!(second.projected, 0);
        assert!(second.degraded.is_empty());
        assert_eq!(forest, snapshot);

        let again = engine.aggregate(&mut forest.users[0]);
        assert_eq!(again.projected, 0);
        assert_eq!(forest, snapshot);
    }

    #[test]
    fn test_bottom_up_sums_on_deep_forest() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut overrun = bug(5, 1, Some(4), 600);
        if let Some(data) = overrun.bug_mut() {
            data.ledger.set(MinutesKind::Done, "coding", 700);
        }

        let mut forest = TaskForest::new(vec![
            user(
                1,
                vec![
                    project(
                        1,
                        vec![
                            category(1, vec![bug(1, 1, None, 120), bug(2, 1, Some(1), 240)]),
                            category(2, vec![bug(3, 1, Some(2), 60)]),
                        ],
                    ),
                    project(2, vec![category(3, vec![bug(4, 1, Some(3), 480), overrun])]),
                ],
            ),
            user(4, vec![project(1, vec![category(1, vec![bug(6, 4, None, 960)])])]),
        ]);

        engine.aggregate_forest(&mut forest);
        for root in &forest.users {
            assert_bottom_up(root);
            assert_eq!(root.state(), ComputeState::Computed);
        }

        let first = &forest.users[0];
        assert_eq!(first.aggregates.done, 700);
        assert_eq!(first.aggregates.overdue, 100);
        assert_eq!(first.aggregates.est, 120 + 240 + 60 + 480 + 700);

        let second = &forest.users[1];
        assert_eq!(second.aggregates.na, 480);
        assert_eq!(second.aggregates.est, 1440);
        assert_eq!(second.aggregates.real_estimate(), 960);
        assert_eq!(second.window, Some(ScheduleWindow::new(at(2, 0), at(5, 0))));
    }

    #[test]
    fn test_missing_and_empty_calendars_degrade_locally() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut forest = TaskForest::new(vec![user(
            1,
            vec![project(
                1,
                vec![category(
                    1,
                    vec![
                        bug(1, 1, None, 480),
                        bug(2, 2, None, 300),
                        bug(3, 2, Some(2), 300),
                        bug(4, 3, None, 60),
                    ],
                )],
            )],
        )]);

        let summary = engine.aggregate_forest(&mut forest);
        assert_eq!(summary.projected, 1);
        let degraded: Vec<BugId> = summary.degraded.iter().map(|d| d.bug_id).collect();
        assert_eq!(degraded, vec![BugId(2), BugId(3), BugId(4)]);
        assert!(summary.degraded[0].reason.contains("No calendar"));

        let no_calendar = forest.find_bug(BugId(2)).unwrap();
        assert_eq!(no_calendar.window, Some(ScheduleWindow::new(at(2, 0), at(2, 0))));
        assert_eq!(no_calendar.aggregates.est, 300);
        assert_eq!(no_calendar.aggregates.na, 0);
        assert!(matches!(
            no_calendar.bug().map(|b| &b.status),
            Some(ScheduleStatus::Degraded { .. })
        ));

        // Successor of a degraded bug starts where it (didn't) end.
        assert_eq!(window_of(&forest, 3).start, at(2, 0));

        let projected = forest.find_bug(BugId(1)).unwrap();
        assert_eq!(
            projected.bug().map(|b| b.status.clone()),
            Some(ScheduleStatus::Projected { iterations: 1 })
        );

        let root = &forest.users[0];
        assert_eq!(root.aggregates.est, 480 + 300 + 300 + 60);
        assert_bottom_up(root);
    }

    #[test]
    fn test_end_beyond_date_range_degrades_only_that_bug() {
        let mut calendars = calendars();
        calendars.insert(ResourceCalendar::new(
            ResourceId(5),
            WeekdayMinutes::new([0, 0, 0, 0, 0, 0, 60]),
        ));
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut forest = TaskForest::new(vec![user(
            5,
            vec![project(
                1,
                vec![category(
                    1,
                    vec![
                        bug(1, 5, None, 60 * 20_000_000),
                        bug(2, 5, Some(1), 60),
                        bug(3, 1, None, 480),
                    ],
                )],
            )],
        )]);

        let summary = engine.aggregate_forest(&mut forest);
        assert_eq!(summary.projected, 2);
        assert_eq!(summary.degraded.len(), 1);
        assert_eq!(summary.degraded[0].bug_id, BugId(1));
        assert!(summary.degraded[0].reason.contains("date range"));

        assert_eq!(window_of(&forest, 1), ScheduleWindow::new(at(2, 0), at(2, 0)));
        // Sunday is the only working day.
        assert_eq!(window_of(&forest, 2), ScheduleWindow::new(at(2, 0), at(9, 0)));
        assert_eq!(window_of(&forest, 3), ScheduleWindow::new(at(2, 0), at(3, 0)));
        assert_bottom_up(&forest.users[0]);
    }

    #[test]
    fn test_bug_under_two_paths_counts_blocked_minutes_once() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut forest = TaskForest::new(vec![user(
            4,
            vec![project(
                1,
                vec![
                    category(1, vec![bug(10, 4, None, 960), bug(11, 4, Some(10), 480)]),
                    category(2, vec![bug(10, 4, None, 960)]),
                ],
            )],
        )]);

        let summary = engine.aggregate_forest(&mut forest);
        assert_eq!(summary.projected, 2);

        let nodes = forest.bugs();
        assert_eq!(nodes[0].aggregates.na, 480);
        assert_eq!(nodes[0].window, Some(ScheduleWindow::new(at(2, 0), at(5, 0))));
        assert_eq!(nodes[1].window, Some(ScheduleWindow::new(at(5, 0), at(6, 0))));
        assert_eq!(nodes[2].window, nodes[0].window);
        assert_eq!(nodes[2].aggregates.na, 0);
        assert_eq!(nodes[2].aggregates.est, 960);

        let root = &forest.users[0];
        assert_eq!(root.aggregates.na, 480);
        assert_eq!(root.aggregates.est, 1440 + 480 + 960);
        assert_bottom_up(root);
    }

    #[test]
    fn test_predecessor_of_other_handler_is_ignored() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut forest = TaskForest::new(vec![user(
            1,
            vec![project(1, vec![category(1, vec![bug(1, 4, None, 960), bug(2, 1, Some(1), 480)])])],
        )]);

        engine.aggregate_forest(&mut forest);
        assert_eq!(window_of(&forest, 2).start, at(2, 0));
    }

    #[test]
    fn test_subtree_aggregation_ignores_outside_predecessor() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut node = category(7, vec![bug(9, 1, Some(8), 480)]);
        engine.aggregate(&mut node);

        assert_eq!(node.window, Some(ScheduleWindow::new(at(2, 0), at(3, 0))));
        assert!(node.children[0].is_computed());
    }

    #[test]
    fn test_past_due_after_projection() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut late = TaskNode::new_bug(BugId(1), 0, Some(at(3, 12)), None, ResourceId(1));
        if let Some(data) = late.bug_mut() {
            data.ledger.set(MinutesKind::Estimate, "design", 960);
        }
        let mut node = category(1, vec![late]);
        engine.aggregate(&mut node);

        assert!(node.children[0].is_past_due());
        assert!(!node.is_past_due());
    }

    #[test]
    fn test_childless_internal_node_has_no_window() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut node = TaskNode::new_project(ProjectId(1), "empty");
        let summary = engine.aggregate(&mut node);
        assert_eq!(summary.projected, 0);
        assert!(node.window.is_none());
        assert_eq!(node.aggregates.est, 0);
        assert!(node.is_computed());
    }

    #[test]
    fn test_remove_empty_children_collapses_leaf_layer() {
        let mut shell = project(1, vec![category(1, vec![]), category(2, vec![])]);
        assert!(remove_empty_children(&mut shell));
        assert!(shell.children.is_empty());
        // Nothing left to prune.
        assert!(!remove_empty_children(&mut shell));

        let mut mixed = project(2, vec![category(1, vec![]), category(2, vec![bug(1, 1, None, 60)])]);
        assert!(!remove_empty_children(&mut mixed));
        assert_eq!(mixed.children.len(), 2);
    }

    #[test]
    fn test_prune_empty_shells_only_touches_grouping_levels() {
        let calendars = calendars();
        let categories = categories();
        let engine = AggregationEngine::new(&calendars, &categories, at(2, 0));

        let mut forest = TaskForest::new(vec![user(
            1,
            vec![
                project(1, vec![category(1, vec![])]),
                project(2, vec![category(2, vec![bug(1, 1, None, 480)])]),
            ],
        )]);

        assert_eq!(prune_empty_shells(&mut forest), 1);
        assert!(forest.users[0].children[0].children.is_empty());
        // Categories keep their bugs.
        assert_eq!(forest.bugs().len(), 1);
        assert_eq!(prune_empty_shells(&mut forest), 0);

        engine.aggregate_forest(&mut forest);
        let root = &forest.users[0];
        assert!(root.children[0].window.is_none());
        assert_eq!(root.window, root.children[1].window);
    }

    #[test]
    fn test_resource_rollup_and_max_real_estimate() {
        let categories = categories();

        let mut overrun = bug(1, 1, None, 600);
        if let Some(data) = overrun.bug_mut() {
            data.ledger.set(MinutesKind::Done, "coding", 700);
        }
        let root = user(
            1,
            vec![project(1, vec![category(1, vec![overrun, bug(2, 2, None, 300), bug(3, 2, None, 200)])])],
        );

        let rollup = ResourceRollup::collect(&root, &categories);
        assert_eq!(rollup.len(), 2);
        assert_eq!(rollup.get(ResourceId(1)).map(|t| t.real_estimate()), Some(700));
        assert_eq!(rollup.get(ResourceId(2)).map(|t| t.remaining), Some(500));
        assert_eq!(rollup.max_real_estimate(), 700);
        assert_eq!(max_real_estimate(&root, &categories), 700);

        let forest = TaskForest::new(vec![root, user(5, vec![])]);
        assert_eq!(forest.max_real_estimate(&categories), 700);
        assert_eq!(ResourceRollup::collect_forest(&forest, &categories).len(), 2);
        assert_eq!(TaskForest::default().max_real_estimate(&categories), 0);
    }
}
