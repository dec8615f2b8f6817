use colored::Colorize;

use crate::network::{Event, StateProbabilities};

const BAR_WIDTH: usize = 40;

/// Renders a posterior as one line per state:
/// `GrassWet = T  0.900  ####################################`
pub fn render_posterior(node: &str, evidence: &Event, result: &StateProbabilities) -> String {
    let mut lines = Vec::with_capacity(result.len() + 1);
    let given = if evidence.is_empty() {
        "no evidence".to_string()
    } else {
        evidence.to_string()
    };
    lines.push(format!("Posterior of {} given {}", node.bold(), given.as_str().italic()));

    let width = result.keys().map(|state| state.len()).max().unwrap_or(0);
    for (state, probability) in result {
        let filled = (probability.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
        let bar = "#".repeat(filled);
        lines.push(format!(
            "  {} = {:<width$}  {:.3}  {}",
            node,
            state,
            probability,
            bar.as_str().green(),
            width = width
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_posterior_lists_every_state() {
        colored::control::set_override(false);
        let result = StateProbabilities::from([("F".to_string(), 0.1), ("T".to_string(), 0.9)]);
        let evidence = Event::from_iter([("Rain", "T"), ("Sprinkler", "F")]);
        let text = render_posterior("GrassWet", &evidence, &result);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Posterior of GrassWet given Rain = T, Sprinkler = F");
        assert_eq!(lines[1], format!("  GrassWet = F  0.100  {}", "#".repeat(4)));
        assert_eq!(lines[2], format!("  GrassWet = T  0.900  {}", "#".repeat(36)));
    }

    #[test]
    fn test_render_without_evidence() {
        colored::control::set_override(false);
        let text = render_posterior("Coin", &Event::new(), &StateProbabilities::new());
        assert_eq!(text, "Posterior of Coin given no evidence");
    }
}
