use std::fmt::Write;

use itertools::Itertools;
use serde::Serialize;
use sieve_core::{OrderOutcome, Outcome, Scenario, SweepPoint};

fn logit(x: f64) -> String {
    match x.is_finite() {
        true => format!("{x:.3}"),
        false => "-inf".into(),
    }
}

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

fn names(scenario: &Scenario, indices: &[usize]) -> String {
    indices
        .iter()
        .map(|&i| scenario.token(i).unwrap_or("?"))
        .join(", ")
}

/// Per-stage logits and probabilities, one column per stage.
pub fn render_outcome(scenario: &Scenario, outcome: &Outcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", scenario.context);

    let header = outcome
        .history
        .iter()
        .map(|record| format!("{:>11}", record.label.to_string()))
        .join(" ");
    let _ = writeln!(out, "{:<12}{header}", "token");

    for (index, token) in scenario.tokens.iter().enumerate() {
        let cells = outcome
            .history
            .iter()
            .map(|record| {
                let cell = match &record.probs {
                    Some(probs) if record.logits[index].is_finite() => format!(
                        "{} {}",
                        logit(record.logits[index]),
                        percent(probs[index])
                    ),
                    _ => "-".into(),
                };
                format!("{cell:>11}")
            })
            .join(" ");
        let _ = writeln!(out, "{token:<12}{cells}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "kept:    {}", names(scenario, &outcome.kept()));
    if outcome.fallback {
        let _ = writeln!(
            out,
            "every token was filtered out, sampled from the temperature stage"
        );
    }
    let _ = writeln!(out, "sampled: {}", scenario.complete(outcome.sampled));
    let _ = writeln!(out, "greedy:  {}", scenario.complete(outcome.greedy));
    out
}

pub fn render_sweep(scenario: &Scenario, points: &[SweepPoint]) -> String {
    let mut out = String::new();
    let header = scenario
        .tokens
        .iter()
        .map(|token| format!("{token:>11}"))
        .join(" ");
    let _ = writeln!(out, "{:<12}{header}", "temperature");
    for point in points {
        let cells = point
            .probs
            .iter()
            .map(|&p| format!("{:>11}", percent(p)))
            .join(" ");
        let _ = writeln!(out, "{:<12.2}{cells}", point.temperature);
    }
    out
}

pub fn render_orders(scenario: &Scenario, orders: &[OrderOutcome]) -> String {
    let mut out = String::new();
    for order in orders {
        let stages = order.stages.iter().join(" -> ");
        let _ = writeln!(out, "temperature -> {stages}");
        let _ = writeln!(out, "    kept:    {}", names(scenario, &order.kept));
        let _ = writeln!(
            out,
            "    sampled: {}{}",
            scenario.token(order.sampled).unwrap_or("?"),
            if order.fallback { " (fallback)" } else { "" }
        );
        let _ = writeln!(
            out,
            "    greedy:  {}",
            scenario.token(order.greedy).unwrap_or("?")
        );
    }
    let distinct = orders.iter().map(|order| &order.kept).unique().count();
    let _ = writeln!(
        out,
        "{} orderings, {distinct} distinct kept sets",
        orders.len()
    );
    out
}

/// JSON view of a result; `-inf` logits serialize as `null`.
pub fn render_json<T: Serialize>(scenario: &Scenario, result: &T) -> anyhow::Result<String> {
    #[derive(Serialize)]
    struct Report<'a, T> {
        scenario: &'a Scenario,
        result: &'a T,
    }
    Ok(serde_json::to_string_pretty(&Report { scenario, result })?)
}

#[cfg(test)]
mod tests {
    use sieve_core::{temperature_sweep, FixedSequence, Pipeline, Stage};

    use super::*;

    #[test]
    fn outcome_table() {
        let scenario = Scenario::default();
        let outcome = Pipeline::default()
            .run(&scenario.logits, FixedSequence::new([0.0]))
            .unwrap();
        let text = render_outcome(&scenario, &outcome);
        assert!(text.starts_with("The rocket lifted off towards the\n"));
        assert!(text.contains("top_p"));
        assert!(text.contains("kept:    moon, stars"));
        assert!(text.contains("sampled: The rocket lifted off towards the moon..."));
        assert!(!text.contains("fallback"));
    }

    #[test]
    fn outcome_table_reports_fallback() {
        let scenario = Scenario::default();
        let pipeline = Pipeline {
            temperature: 1.0,
            stages: vec![Stage::Ban(vec![0, 1, 2, 3, 4])],
        };
        let outcome = pipeline
            .run(&scenario.logits, FixedSequence::new([0.0]))
            .unwrap();
        let text = render_outcome(&scenario, &outcome);
        assert!(text.contains("sampled from the temperature stage"));
    }

    #[test]
    fn sweep_table() {
        let scenario = Scenario::default();
        let points = temperature_sweep(&scenario.logits, 0.5, 1.0, 0.5).unwrap();
        let text = render_sweep(&scenario, &points);
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(2).unwrap().contains("40.6%"));
    }

    #[test]
    fn orders_summary() {
        let scenario = Scenario::default();
        let pipeline = Pipeline {
            temperature: 1.0,
            stages: vec![Stage::MinP(0.5), Stage::TopP(0.7)],
        };
        let orders = pipeline
            .explore_orders(&scenario.logits, FixedSequence::new([0.9]))
            .unwrap();
        let text = render_orders(&scenario, &orders);
        assert!(text.contains("temperature -> min_p=0.5 -> top_p=0.7"));
        assert!(text.ends_with("2 orderings, 2 distinct kept sets\n"));
    }

    #[test]
    fn json_report() {
        let scenario = Scenario::default();
        let outcome = Pipeline::default()
            .run(&scenario.logits, FixedSequence::new([0.0]))
            .unwrap();
        let json = render_json(&scenario, &outcome).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["result"]["greedy"], 0);
        assert_eq!(value["result"]["history"][0]["label"], "original");
        assert!(value["result"]["history"][4]["logits"][4].is_null());
    }
}
