#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    studio_shell::app_runtime::run();
}
