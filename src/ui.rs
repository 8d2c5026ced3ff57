use crate::models::StatsResponse;
use crate::notify::Notification;
use crate::utils::format_file_size;

pub fn render_index(stats: &StatsResponse, notifications: &[Notification]) -> String {
    let items: String = notifications
        .iter()
        .take(10)
        .map(|note| {
            format!(
                "<li class=\"note {:?}\"><time>{}</time> {}</li>",
                note.severity,
                note.at.format("%Y-%m-%d %H:%M"),
                escape_html(&note.message)
            )
        })
        .collect();
    let items = if items.is_empty() {
        "<li class=\"empty\">Nothing yet.</li>".to_string()
    } else {
        items
    };

    INDEX_HTML
        .replace("{{RECORDS}}", &stats.records.to_string())
        .replace("{{IMAGES}}", &stats.images.to_string())
        .replace("{{OPTIMIZED}}", &stats.optimized.to_string())
        .replace("{{STORED}}", &format_file_size(stats.stored_bytes))
        .replace("{{SAVED}}", &format_file_size(stats.saved_bytes))
        .replace("{{NOTIFICATIONS}}", &items)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Punch Journal</title>
  <style>
    :root {
      --bg: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --muted: #7a746a;
      --card: rgba(255, 255, 255, 0.9);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      font-family: "Space Grotesk", system-ui, sans-serif;
      background: var(--bg);
      color: var(--ink);
      display: flex;
      justify-content: center;
      padding: 48px 16px;
    }

    main {
      width: min(640px, 100%);
      background: var(--card);
      border-radius: 24px;
      padding: 32px;
      box-shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    h1 { margin: 0 0 24px; font-size: 2rem; }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(120px, 1fr));
      gap: 12px;
      margin-bottom: 24px;
    }

    .tile {
      background: #fff;
      border-radius: 16px;
      padding: 16px;
      text-align: center;
    }

    .tile strong { display: block; font-size: 1.6rem; }
    .tile span { color: var(--muted); font-size: 0.85rem; }

    button {
      border: none;
      border-radius: 999px;
      padding: 14px 28px;
      font-size: 1rem;
      background: var(--accent);
      color: #fff;
      cursor: pointer;
    }

    ul { list-style: none; padding: 0; margin: 24px 0 0; }
    li { padding: 8px 0; border-bottom: 1px solid #eee3cf; }
    li time { color: var(--muted); margin-right: 8px; }
    li.Success { color: #2f7d4a; }
    li.empty { color: var(--muted); }
  </style>
</head>
<body>
  <main>
    <h1>Punch Journal</h1>
    <section class="grid">
      <div class="tile"><strong>{{RECORDS}}</strong><span>records</span></div>
      <div class="tile"><strong>{{IMAGES}}</strong><span>photos</span></div>
      <div class="tile"><strong>{{OPTIMIZED}}</strong><span>optimized</span></div>
      <div class="tile"><strong>{{STORED}}</strong><span>stored</span></div>
      <div class="tile"><strong>{{SAVED}}</strong><span>saved</span></div>
    </section>
    <form method="post" action="/optimize">
      <button type="submit">Optimize now</button>
    </form>
    <ul>{{NOTIFICATIONS}}</ul>
  </main>
</body>
</html>
"#;
