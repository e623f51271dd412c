use crate::App;

/// A user reduce function: folds every value seen for `key` into one output value.
///
/// Implementations must not depend on the order of `values`. An `Err` fails the
/// whole reduce task.
pub trait Reducer {
    fn reduce(&self, key: &str, values: Vec<String>) -> anyhow::Result<String>;
}

impl<F> Reducer for F
where
    F: Fn(&str, Vec<String>) -> anyhow::Result<String>,
{
    fn reduce(&self, key: &str, values: Vec<String>) -> anyhow::Result<String> {
        self(key, values)
    }
}

impl Reducer for App {
    fn reduce(&self, key: &str, values: Vec<String>) -> anyhow::Result<String> {
        self.call_reduce(key, values).map_err(|msg| {
            anyhow::anyhow!("{} reduce failed for key {:?}: {}", self.app_name, key, msg)
        })
    }
}
