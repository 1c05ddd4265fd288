use rmcp::model::{GetPromptResult, PromptMessage, PromptMessageRole};

pub fn cycle_overview_prompt(months: u32) -> GetPromptResult {
    GetPromptResult::new(vec![PromptMessage::new_text(
        PromptMessageRole::User,
        format!(
            "Give me an overview of my cycle tracking.\n\nInclude:\n1. My logged cycles (use list_cycle_entries)\n2. Average cycle and period length with the predicted next start (use get_cycle_statistics)\n3. A calendar of the current month and the next {} months (use get_cycle_calendar)\n4. Whether my supplies will last until the predicted start (use view_cart and list_products)\n\nKeep the summary short and factual. Predictions are averages of past cycles, not medical advice.",
            months.saturating_sub(1)
        ),
    )])
    .with_description(format!("Cycle overview for the coming {} months", months))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overview_mentions_calendar_tool() {
        let p = cycle_overview_prompt(3);
        assert_eq!(p.messages.len(), 1);
        assert!(p.description.unwrap().contains("3 months"));
    }
}
