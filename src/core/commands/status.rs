use crate::core::state::ShellState;

/// `status`: the last foreground result, `exit value 0` before any ran.
pub fn report_status(state: &ShellState) -> String {
    state.last_status().to_string()
}
