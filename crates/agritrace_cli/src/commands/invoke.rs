//! Invoke command implementation.

use super::open_contract;
use agritrace_core::{Caller, Dispatcher};
use std::path::Path;

/// Runs the invoke command.
pub fn run(
    path: &Path,
    caller: &str,
    function: &str,
    args: &[String],
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::new(open_contract(path)?);
    let answer = dispatcher.invoke(&Caller::new(caller), function, args)?;
    println!("{}", render(&answer, pretty)?);
    Ok(())
}

fn render(answer: &str, pretty: bool) -> Result<String, serde_json::Error> {
    if !pretty {
        return Ok(answer.to_string());
    }
    let value: serde_json::Value = serde_json::from_str(answer)?;
    serde_json::to_string_pretty(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");
        run(
            &path,
            "farmer",
            "CreateProduct",
            &[r#"{"id":"P1","name":"Rice","farmerId":"F1"}"#.to_string()],
            false,
        )
        .unwrap();

        let contract = open_contract(&path).unwrap();
        assert_eq!(contract.query_product("P1").unwrap().farmer_id, "F1");
    }

    #[test]
    fn pretty_rendering() {
        assert_eq!(render("true", false).unwrap(), "true");
        assert!(render(r#"{"a":1}"#, true).unwrap().contains('\n'));
    }
}
