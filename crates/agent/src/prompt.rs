/// The single-turn prompt asking for `count` products that go with `name`.
pub fn suggestion_prompt(name: &str, count: usize) -> String {
    format!(
        "Suggest {count} products to buy with {name}. Return as 1 word JSON array of strings. \
         e.g., [\"Milk\", \"Butter\", \"Jam\"]"
    )
}

#[cfg(test)]
mod tests {
    use super::suggestion_prompt;

    #[test]
    fn prompt_names_count_and_item() {
        assert_eq!(
            suggestion_prompt("Corn Flakes", 10),
            "Suggest 10 products to buy with Corn Flakes. Return as 1 word JSON array of \
             strings. e.g., [\"Milk\", \"Butter\", \"Jam\"]"
        );
    }
}
