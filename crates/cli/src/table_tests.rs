// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn render_to_string(table: &Table) -> String {
    let mut buf = Vec::new();
    table.render(&mut buf);
    String::from_utf8(buf).unwrap()
}

#[test]
fn empty_table_prints_nothing() {
    let table = Table::plain(vec![Column::left("NAME"), Column::left("STATUS")]);
    assert_eq!(render_to_string(&table), "");
}

#[test]
fn multi_column_left_alignment() {
    let mut table = Table::plain(vec![Column::left("NAME"), Column::left("TOOL")]);
    table.row(vec!["backup".into(), "auto".into()]);
    table.row(vec!["b".into(), "robot".into()]);
    let out = render_to_string(&table);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines, vec!["NAME    TOOL", "backup  auto", "b       robot"]);
}

#[test]
fn right_alignment() {
    let mut table = Table::plain(vec![Column::left("TASK"), Column::right("RUNS")]);
    table.row(vec!["alpha".into(), "5".into()]);
    table.row(vec!["beta".into(), "123".into()]);
    let out = render_to_string(&table);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines, vec!["TASK   RUNS", "alpha     5", "beta    123"]);
}

#[test]
fn max_width_truncates_by_character() {
    let mut table = Table::plain(vec![Column::left("ID").with_max(4), Column::left("NAME")]);
    table.row(vec!["0123456789".into(), "résumé".into()]);
    table.row(vec!["ab".into(), "x".into()]);
    let out = render_to_string(&table);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines[1], "0123  résumé");
    assert_eq!(lines[2], "ab    x");
}

#[test]
fn trailing_empty_cells_are_trimmed() {
    let mut table = Table::plain(vec![Column::left("NAME"), Column::left("NOTE")]);
    table.row(vec!["only".into()]);
    let out = render_to_string(&table);
    assert_eq!(out.lines().nth(1), Some("only"));
}

#[test]
fn colored_table_styles_header_and_status() {
    let mut table = Table::colored(vec![Column::left("NAME"), Column::status("STATUS")]);
    table.row(vec!["backup".into(), "failed (exit 1)".into()]);
    let out = render_to_string(&table);

    assert!(out.contains("\x1b[38;5;74mNAME"));
    assert!(out.contains("\x1b[31mfailed (exit 1)"));
}

#[test]
fn muted_column_uses_muted_color() {
    let mut table = Table::colored(vec![Column::muted("ID"), Column::left("NAME")]);
    table.row(vec!["abc".into(), "x".into()]);
    let out = render_to_string(&table);
    assert!(out.contains("\x1b[38;5;240mabc"));
}
