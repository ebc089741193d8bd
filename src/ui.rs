use crate::config::Settings;
use crate::stats::{Progress, Snapshot};
use std::fmt::Write;

pub fn render_index(snapshot: &Snapshot, settings: &Settings) -> String {
    let today = &snapshot.today.totals;
    let week = &snapshot.week;

    let rings = [
        ring("Calories", &snapshot.calories, "kcal", "calories", Some(snapshot.bmr_marker)),
        ring("Protein", &snapshot.protein, "g", "protein", None),
        ring("Fat", &snapshot.fat, "g", "fat", None),
        ring("Carbs", &snapshot.carbs, "g", "carbs", None),
    ]
    .concat();
    let weekly_rings = [
        ring("Avg protein", &week.protein, "g", "protein", None),
        ring("Avg fat", &week.fat, "g", "fat", None),
        ring("Avg carbs", &week.carbs, "g", "carbs", None),
    ]
    .concat();

    let last = week.days.len().saturating_sub(1);
    let mut bars = String::new();
    for (idx, day) in week.days.iter().enumerate() {
        // today's empty bar carries no caption
        let info = if idx == last && day.calories == 0.0 {
            String::new()
        } else {
            let sign = if day.deficit > 0.0 { "+" } else { "" };
            format!("{}<br>{sign}{}", day.calories.round(), day.deficit.round())
        };
        let _ = write!(
            bars,
            r#"<div class="bar-col"><div class="bar" style="height:{:.1}%"></div><div class="bar-info">{info}</div><div class="bar-date">{}</div></div>"#,
            day.bar_height * 100.0,
            day.label,
        );
    }

    INDEX_HTML
        .replace("{{NAME}}", &escape_html(&settings.name))
        .replace("{{DATE}}", &snapshot.date)
        .replace("{{CONSUMED}}", &today.calories.round().to_string())
        .replace("{{GOAL}}", &settings.daily_calorie_goal.round().to_string())
        .replace("{{TDEE}}", &settings.tdee.round().to_string())
        .replace("{{NET}}", &snapshot.balance.display())
        .replace("{{RINGS}}", &rings)
        .replace("{{BARS}}", &bars)
        .replace("{{TDEE_LINE}}", &format!("{:.1}", week.tdee_marker * 100.0))
        .replace("{{GOAL_LINE}}", &format!("{:.1}", week.goal_marker * 100.0))
        .replace("{{AVG_BAR}}", &format!("{:.1}", week.average_bar * 100.0))
        .replace("{{AVG}}", &week.averages.calories.to_string())
        .replace("{{AVG_NET}}", &week.average_balance.display())
        .replace("{{WEEKLY_RINGS}}", &weekly_rings)
}

fn ring(label: &str, progress: &Progress, unit: &str, class: &str, bmr: Option<f64>) -> String {
    // BMR tick wraps past a full turn when BMR exceeds the goal
    let marker = bmr
        .filter(|ratio| *ratio > 0.0)
        .map(|ratio| format!(";--bmr-deg:{:.1}deg", (ratio * 360.0) % 360.0))
        .unwrap_or_default();
    format!(
        r#"<div class="ring {class}" style="--deg:{:.1}deg;--over-deg:{:.1}deg{marker}"><div class="ring-inner"><span class="value">{} {unit}</span><span class="label">{label}</span></div></div>"#,
        progress.fill * 360.0,
        progress.over.min(1.0) * 360.0,
        progress.value.round(),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Calorie Ledger</title>
  <style>
    :root {
      --bg: #10151c;
      --card: rgba(255, 255, 255, 0.06);
      --ink: #eef2f6;
      --muted: #8d99a6;
      --calories: #ff6b4a;
      --protein: #4ac1ff;
      --fat: #ffc24a;
      --carbs: #7be07b;
      --over: #ff2d55;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(900px, 100%);
      display: grid;
      gap: 24px;
    }

    .card {
      background: var(--card);
      border-radius: 24px;
      padding: 24px;
      display: grid;
      gap: 16px;
    }

    h1, h2 {
      margin: 0;
    }

    .subtitle {
      margin: 0;
      color: var(--muted);
    }

    .rings {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(140px, 1fr));
      gap: 16px;
      justify-items: center;
    }

    .ring {
      --color: var(--calories);
      width: 132px;
      height: 132px;
      border-radius: 50%;
      background:
        conic-gradient(var(--over) var(--over-deg), transparent 0),
        conic-gradient(var(--color) var(--deg), rgba(255, 255, 255, 0.08) 0);
      display: grid;
      place-items: center;
    }

    .ring[style*="--bmr-deg"] {
      background:
        conic-gradient(from calc(var(--bmr-deg) - 1deg), var(--ink) 0 2deg, transparent 0),
        conic-gradient(var(--over) var(--over-deg), transparent 0),
        conic-gradient(var(--color) var(--deg), rgba(255, 255, 255, 0.08) 0);
    }

    .ring.protein { --color: var(--protein); }
    .ring.fat { --color: var(--fat); }
    .ring.carbs { --color: var(--carbs); }

    .ring-inner {
      width: 104px;
      height: 104px;
      border-radius: 50%;
      background: var(--bg);
      display: grid;
      place-content: center;
      text-align: center;
    }

    .ring .label {
      font-size: 0.75rem;
      color: var(--muted);
      text-transform: uppercase;
      letter-spacing: 0.1em;
    }

    .chart {
      position: relative;
      height: 220px;
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 10px;
      align-items: end;
    }

    .bar-col {
      height: 100%;
      display: grid;
      grid-template-rows: 1fr auto auto;
      align-items: end;
      text-align: center;
      font-size: 0.75rem;
    }

    .bar {
      background: var(--calories);
      border-radius: 8px 8px 0 0;
      min-height: 2px;
    }

    .bar-date {
      color: var(--muted);
    }

    .avg-track {
      position: relative;
      height: 14px;
      border-radius: 999px;
      background: rgba(255, 255, 255, 0.08);
    }

    .avg-fill {
      height: 100%;
      border-radius: 999px;
      background: var(--calories);
    }

    .marker {
      position: absolute;
      top: -4px;
      bottom: -4px;
      width: 2px;
    }

    .marker.goal { background: var(--carbs); }
    .marker.tdee { background: var(--protein); }

    form {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    input {
      flex: 1 1 90px;
      padding: 10px;
      border-radius: 10px;
      border: none;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      font-weight: 600;
      background: var(--calories);
      color: white;
      cursor: pointer;
    }
  </style>
</head>
<body>
  <main class="app">
    <section class="card">
      <h1>Hi, {{NAME}}</h1>
      <p class="subtitle">{{DATE}} &middot; {{CONSUMED}} of {{GOAL}} kcal &middot; TDEE {{TDEE}} &middot; {{NET}}</p>
      <div class="rings">{{RINGS}}</div>
    </section>

    <section class="card">
      <h2>Last 7 days</h2>
      <div class="chart">{{BARS}}</div>
      <div class="avg-track">
        <div class="avg-fill" style="width:{{AVG_BAR}}%"></div>
        <div class="marker goal" style="left:{{GOAL_LINE}}%"></div>
        <div class="marker tdee" style="left:{{TDEE_LINE}}%"></div>
      </div>
      <p class="subtitle">Average: {{AVG}} kcal &middot; Goal: {{GOAL}} kcal &middot; {{AVG_NET}}</p>
      <div class="rings">{{WEEKLY_RINGS}}</div>
    </section>

    <section class="card">
      <h2>Log food</h2>
      <form method="post" action="/entry">
        <input name="food" placeholder="Food" />
        <input name="calories" placeholder="kcal" inputmode="decimal" />
        <input name="protein" placeholder="Protein g" inputmode="decimal" />
        <input name="fat" placeholder="Fat g" inputmode="decimal" />
        <input name="carb" placeholder="Carbs g" inputmode="decimal" />
        <button type="submit">Add</button>
      </form>
      <h2>Log exercise</h2>
      <form method="post" action="/exercise">
        <input name="name" placeholder="Exercise" />
        <input name="calories" placeholder="kcal burned" inputmode="decimal" />
        <button type="submit">Burn</button>
      </form>
    </section>
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppData, MacroTotals};
    use crate::stats::build_snapshot_at;
    use chrono::NaiveDate;

    #[test]
    fn index_renders_totals_and_escapes_name() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let mut data = AppData::new(today, Settings::default());
        data.settings.name = "<Sam>".to_string();
        data.ledger
            .add_entry(today, MacroTotals::new(500.0, 30.0, 10.0, 40.0));

        let html = render_index(&build_snapshot_at(today, &data), &data.settings);
        assert!(html.contains("Hi, &lt;Sam&gt;"));
        assert!(html.contains("500 of 2300 kcal"));
        assert!(html.contains("Deficit: +1350"));
        assert!(html.contains("Average: 500 kcal"));
        // 1850 / 2300 of a turn, on the calorie ring only
        assert!(html.contains("--bmr-deg:289.6deg"));
        assert_eq!(html.matches(";--bmr-deg:").count(), 1);
        assert!(!html.contains("{{"));
    }
}
