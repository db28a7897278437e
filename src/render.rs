use chrono::NaiveDate;

use crate::posting::Posting;

const INITIATOR: &str = "Я";
const INITIAL_STATUS: &str = "Новая";
const FINAL_STATUS_PLACEHOLDER: &str = "-";

/// Tidy scraped description text: right-trim lines, drop blank lines at
/// both ends, collapse blank runs to a single blank line.
pub fn clean_description(description: &str) -> String {
    let lines: Vec<&str> = description.split('\n').map(str::trim_end).collect();

    let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(start);

    let mut out: Vec<&str> = Vec::with_capacity(end - start + 1);
    let mut prev_blank = false;
    for &line in &lines[start..=end] {
        let blank = line.trim().is_empty();
        if !(blank && prev_blank) {
            out.push(line);
        }
        prev_blank = blank;
    }
    out.join("\n")
}

/// Render a posting as the vacancy note written to the output directory.
/// `today` fills both the started and last-updated dates.
pub fn to_markdown(posting: &Posting, today: NaiveDate) -> String {
    let heading = format!(
        "{} - {}",
        posting.company.as_deref().unwrap_or("Unknown"),
        posting.title.as_deref().unwrap_or("Unknown"),
    );
    let now = today.format("%Y-%m-%d");
    let search_method = if posting.search_info.is_empty() {
        String::new()
    } else {
        format!("- Способ поиска: {}\n", posting.search_info)
    };

    format!(
        "# {heading}

- URL: {url}
- Компания: {company}
- Должность: {position}
- Локация: {location}
- Инициатор: {INITIATOR}
- Источник: {site}
{search_method}- Опубликовано: {date_posted}
- Начато: {now}
- Обновлено: {now}
- Текущий статус: {INITIAL_STATUS}
- Финальный статус: {FINAL_STATUS_PLACEHOLDER}

## Описание вакансии

{description}

",
        url = posting.job_url,
        company = posting.company_or_empty(),
        position = posting.title_or_empty(),
        location = posting.location.as_deref().unwrap_or(""),
        site = posting.site,
        date_posted = posting.date_posted.as_deref().unwrap_or(""),
        description = clean_description(posting.description_or_empty()),
    )
}
