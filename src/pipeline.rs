// 🔄 Processing Pipeline - workbook in, report out
//
// roster sheet → alias index ─┐
// posts sheet  → splitter → matcher → aggregator → report
//
// Every input-format check (sheets, required columns) runs before the first
// post is processed: a run either yields the full report or an error.

use crate::aggregator::MentionAggregator;
use crate::config::Config;
use crate::entities::{AliasIndex, Post, PostColumns};
use crate::error::Result;
use crate::matcher::CompanyMatcher;
use crate::report::{build_report, Report, RunStats};
use crate::workbook::Workbook;
use std::path::Path;
use tracing::{debug, info};

/// Progress is logged every this many posts
const PROGRESS_EVERY: usize = 100;

/// Read a workbook file (or CSV directory) and build the mention report
pub fn process_uploaded_file(path: &Path, config: &Config) -> Result<Report> {
    info!("Processing file: {}", path.display());
    let workbook = Workbook::open(path)?;
    process_workbook(&workbook, config)
}

/// Build the alias index from the workbook's roster sheet
pub fn build_index(workbook: &Workbook, config: &Config) -> Result<AliasIndex> {
    let roster = workbook.sheet(&config.workbook.roster_sheet)?;
    AliasIndex::from_roster_sheet(roster, &config.workbook, &config.matcher)
}

/// Run the engine over an in-memory workbook
pub fn process_workbook(workbook: &Workbook, config: &Config) -> Result<Report> {
    let posts = workbook.sheet(&config.workbook.posts_sheet)?;
    let roster = workbook.sheet(&config.workbook.roster_sheet)?;
    info!("Loaded posts: {}, roster rows: {}", posts.len(), roster.len());

    let columns = PostColumns::resolve(posts, &config.workbook)?;
    let index = AliasIndex::from_roster_sheet(roster, &config.workbook, &config.matcher)?;
    let matcher = CompanyMatcher::new(&config.matcher)?;

    let mut aggregator = MentionAggregator::new(&index);
    for (processed, row) in posts.iter_rows().enumerate() {
        let post = Post::from_row(&row, &columns);

        let identities = matcher.match_post(post.annotation, &index);
        if post.annotation.is_none() {
            debug!("Post line {}: empty annotation", post.line_number);
        } else {
            debug!("Post line {}: {} companies", post.line_number, identities.len());
        }

        aggregator.record_post(post.source_link(), &identities);

        if (processed + 1) % PROGRESS_EVERY == 0 {
            info!("Processed posts: {}/{}", processed + 1, posts.len());
        }
    }

    let known_companies = aggregator.records().iter().filter(|r| r.is_known()).count();
    let stats = RunStats {
        posts_scanned: aggregator.posts_seen(),
        posts_with_mentions: aggregator.posts_with_mentions(),
        roster_companies: index.company_count(),
        aliases: index.alias_count(),
        alias_collisions: index.collisions().len(),
        known_companies,
        free_companies: aggregator.len() - known_companies,
    };

    let rows = build_report(aggregator.records());
    info!("Report built: {} rows ({})", rows.len(), stats.summary());

    Ok(Report { rows, stats })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use crate::workbook::Sheet;
    use std::fs;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn roster(rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            "для ВПР",
            strings(&[
                "#",
                "Полное имя",
                "Also known as (AKA)",
                "Ответственный ДК",
                "Ответственный Media",
            ]),
            rows.iter().map(|r| strings(r)).collect(),
        )
    }

    fn posts(rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            "vk",
            strings(&["GPT", "Пост", "Группа"]),
            rows.iter().map(|r| strings(r)).collect(),
        )
    }

    #[test]
    fn test_end_to_end_colon_rule_and_free_mention() {
        let workbook = Workbook::new(vec![
            posts(&[
                &["альфа-банк: стажировка", "p1", ""],
                &["неизвестная компания ооо", "", "g1"],
            ]),
            roster(&[&["1", "альфа", "alfa, альфа-банк", "", ""]]),
        ]);

        let report = process_workbook(&workbook, &Config::default()).unwrap();

        // Only the text after the first colon counts: "стажировка" is a stop word
        assert_eq!(report.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.company, "неизвестная компания");
        assert_eq!(row.mention_count, 1);
        assert_eq!(row.links, "g1");
        assert!(!row.known_in_roster);

        assert_eq!(report.stats.posts_scanned, 2);
        assert_eq!(report.stats.posts_with_mentions, 1);
        assert_eq!(report.stats.free_companies, 1);
    }

    #[test]
    fn test_known_and_free_mentions_with_counts() {
        let workbook = Workbook::new(vec![
            roster(&[
                &["1", "Альфа", "alfa, альфа банк", "Иванов", "Петрова"],
                &["2", "Яндекс", "yandex", "", ""],
                &["3", "", "ghost", "", ""],
            ]),
            posts(&[
                &["Компании: Alfa; Яндекс ООО", "p1", "g1"],
                &["Альфа Банк, альфа, Ромашка", "", "g2"],
                &["Альфа", "p1", ""],
                &["", "p4", ""],
                &["стажировка, 123, vk", "p5", ""],
            ]),
        ]);

        let report = process_workbook(&workbook, &Config::default()).unwrap();

        let alfa = &report.rows[0];
        assert_eq!(alfa.company, "альфа");
        assert_eq!(alfa.mention_count, 3);
        assert_eq!(alfa.links, "p1, g2");
        assert_eq!(alfa.id, "1");
        assert_eq!(alfa.owner_events, "Иванов");
        assert_eq!(alfa.owner_media, "Петрова");
        assert!(alfa.known_in_roster);

        // Ties keep first-seen order: "яндекс" (post 1) before "ромашка" (post 2)
        assert_eq!(report.rows[1].company, "яндекс");
        assert_eq!(report.rows[1].mention_count, 1);
        assert!(report.rows[1].known_in_roster);
        assert_eq!(report.rows[2].company, "ромашка");
        assert!(!report.rows[2].known_in_roster);
        assert_eq!(report.len(), 3);

        assert_eq!(report.stats.roster_companies, 2);
        assert_eq!(report.stats.known_companies, 2);
        assert_eq!(report.stats.posts_with_mentions, 3);
    }

    #[test]
    fn test_run_is_deterministic() {
        let workbook = Workbook::new(vec![
            roster(&[&["1", "Сбер", "сбербанк", "", ""]]),
            posts(&[
                &["Ромашка, Лютик, Сбер", "p1", ""],
                &["Василек; Лютик", "p2", ""],
                &["Сбербанк, Ромашка", "p3", ""],
            ]),
        ]);

        let first = process_workbook(&workbook, &Config::default()).unwrap();
        let second = process_workbook(&workbook, &Config::default()).unwrap();

        assert_eq!(first, second);
        let names: Vec<&str> = first.rows.iter().map(|r| r.company.as_str()).collect();
        assert_eq!(names, vec!["ромашка", "лютик", "сбер", "василек"]);
    }

    #[test]
    fn test_missing_sheet_fails_run() {
        let workbook = Workbook::new(vec![posts(&[&["Яндекс", "p1", ""]])]);

        let err = process_workbook(&workbook, &Config::default()).unwrap_err();
        assert!(matches!(err, IngestError::MissingSheet { ref sheet, .. } if sheet == "для ВПР"));
    }

    #[test]
    fn test_missing_annotation_column_fails_run() {
        let workbook = Workbook::new(vec![
            roster(&[&["1", "Яндекс", "", "", ""]]),
            Sheet::new("vk", strings(&["Пост"]), vec![strings(&["p1"])]),
        ]);

        let err = process_workbook(&workbook, &Config::default()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { ref column, .. } if column == "GPT"));
    }

    #[test]
    fn test_process_uploaded_csv_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("vk.csv"),
            "GPT,Пост,Группа\n\"Яндекс, Озон\",https://vk.com/wall-1_1,\nОзон,,https://vk.com/club1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("для ВПР.csv"),
            "#,Полное имя,Also known as (AKA),Ответственный ДК,Ответственный Media\n12,Озон,ozon,Иванов,\n",
        )
        .unwrap();

        let report = process_uploaded_file(dir.path(), &Config::default()).unwrap();

        assert_eq!(report.rows[0].company, "озон");
        assert_eq!(report.rows[0].mention_count, 2);
        assert_eq!(
            report.rows[0].links,
            "https://vk.com/wall-1_1, https://vk.com/club1"
        );
        assert_eq!(report.rows[0].id, "12");
        assert_eq!(report.rows[1].company, "яндекс");
        assert!(!report.rows[1].known_in_roster);
    }

    #[test]
    fn test_process_uploaded_xlsx_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.xlsx");

        let mut xlsx = rust_xlsxwriter::Workbook::new();
        let posts = xlsx.add_worksheet();
        posts.set_name("vk").unwrap();
        posts.write_row(0, 0, ["GPT", "Пост", "Группа"]).unwrap();
        posts.write_string(1, 0, "Компании: Альфа; Ромашка ООО").unwrap();
        posts.write_string(1, 1, "p1").unwrap();
        posts.write_string(2, 0, "alfa").unwrap();
        posts.write_string(2, 2, "g2").unwrap();

        let roster = xlsx.add_worksheet();
        roster.set_name("для ВПР").unwrap();
        roster
            .write_row(
                0,
                0,
                ["#", " Полное имя ", "Also known as (AKA)", "Ответственный ДК", "Ответственный Media"],
            )
            .unwrap();
        roster.write_number(1, 0, 12).unwrap();
        roster.write_string(1, 1, "Альфа").unwrap();
        roster.write_string(1, 2, "alfa").unwrap();
        roster.write_string(1, 3, "Иванов").unwrap();
        xlsx.save(&path).unwrap();

        let report = process_uploaded_file(&path, &Config::default()).unwrap();

        assert_eq!(report.len(), 2);
        let alfa = &report.rows[0];
        assert_eq!(alfa.id, "12");
        assert_eq!(alfa.company, "альфа");
        assert_eq!(alfa.mention_count, 2);
        assert_eq!(alfa.links, "p1, g2");
        assert_eq!(alfa.owner_events, "Иванов");
        assert!(alfa.known_in_roster);

        let romashka = &report.rows[1];
        assert_eq!(romashka.id, "");
        assert_eq!(romashka.company, "ромашка");
        assert_eq!(romashka.mention_count, 1);
        assert_eq!(romashka.links, "p1");
        assert!(!romashka.known_in_roster);
    }

    #[test]
    fn test_process_uploaded_file_unreadable() {
        let dir = tempfile::tempdir().unwrap();

        let missing = process_uploaded_file(&dir.path().join("nope.xlsx"), &Config::default());
        assert!(matches!(missing, Err(IngestError::Io { .. })));

        let broken = dir.path().join("broken.xlsx");
        fs::write(&broken, b"garbage").unwrap();
        let corrupt = process_uploaded_file(&broken, &Config::default());
        assert!(matches!(corrupt, Err(IngestError::Workbook { .. })));
    }

    #[test]
    fn test_build_index_from_workbook() {
        let workbook = Workbook::new(vec![roster(&[
            &["1", "Тинькофф", "tinkoff", "", ""],
            &["2", "Т-Банк", "tinkoff", "", ""],
        ])]);

        let index = build_index(&workbook, &Config::default()).unwrap();
        assert_eq!(index.resolve_alias("tinkoff"), Some("т-банк"));
        assert_eq!(index.collisions().len(), 1);
    }

    #[test]
    fn test_custom_sheet_names() {
        let mut config = Config::default();
        config.workbook.posts_sheet = "posts".to_string();
        config.workbook.roster_sheet = "roster".to_string();

        let mut posts_sheet = posts(&[&["Лютик", "p1", ""]]);
        posts_sheet.name = "posts".to_string();
        let mut roster_sheet = roster(&[]);
        roster_sheet.name = "roster".to_string();

        let report = process_workbook(&Workbook::new(vec![posts_sheet, roster_sheet]), &config).unwrap();
        assert_eq!(report.rows[0].company, "лютик");
    }
}
