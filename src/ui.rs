use crate::actions::{RecordOutcome, remediation};
use crate::config::Config;
use crate::models::{DrinkKind, ScoresResponse};
use rand::seq::IndexedRandom;
use serde::Deserialize;

const QUOTES: &[&str] = &[
    "Caffeine excites my electrons to a higher energy state.",
    "Coffee: the essential cofactor for my productivity enzymes.",
    "I need coffee right meow.",
    "Warning: coffee may cause laser-like focus on absolutely nothing.",
    "My energy level is in the ground state. Insert coffee to excite electrons.",
    "Coffee and cats: profound vibration experts.",
    "Resistance is futile. You will be caffeinated.",
];

pub fn pick_quote() -> &'static str {
    QUOTES.choose(&mut rand::rng()).copied().unwrap_or(QUOTES[0])
}

/// Feedback carried through the redirect after a button press.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub notice: Option<String>,
    pub user: Option<String>,
    pub drink: Option<String>,
    pub wait: Option<u64>,
    pub column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Recorded { user: String, drink: DrinkKind },
    Cooldown { user: String, wait: u64 },
    SchemaMismatch { column: String },
    Failed { user: String },
}

impl Notice {
    pub fn from_outcome(user: &str, drink: DrinkKind, outcome: RecordOutcome) -> Self {
        let user = user.to_string();
        match outcome {
            RecordOutcome::Recorded => Notice::Recorded { user, drink },
            RecordOutcome::CooldownActive { remaining_seconds } => Notice::Cooldown {
                user,
                wait: remaining_seconds,
            },
            RecordOutcome::SchemaMismatch { column } => Notice::SchemaMismatch { column },
            RecordOutcome::Failed { .. } => Notice::Failed { user },
        }
    }

    /// Reads a notice back out of the query string. Names that are not
    /// configured users are ignored.
    pub fn from_query(query: &IndexQuery, config: &Config) -> Option<Self> {
        let user = || {
            query
                .user
                .as_deref()
                .filter(|user| config.is_tracked(user))
                .map(str::to_string)
        };

        match query.notice.as_deref()? {
            "recorded" => Some(Notice::Recorded {
                user: user()?,
                drink: DrinkKind::parse(query.drink.as_deref()?)?,
            }),
            "cooldown" => Some(Notice::Cooldown {
                user: user()?,
                wait: query.wait?,
            }),
            "schema" => {
                let column = query.column.as_deref().unwrap_or("drink_id");
                let valid = !column.is_empty()
                    && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                valid.then(|| Notice::SchemaMismatch {
                    column: column.to_string(),
                })
            }
            "failed" => Some(Notice::Failed { user: user()? }),
            _ => None,
        }
    }

    pub fn to_query(&self) -> String {
        match self {
            Notice::Recorded { user, drink } => format!(
                "notice=recorded&user={}&drink={}",
                encode_component(user),
                drink.as_str()
            ),
            Notice::Cooldown { user, wait } => {
                format!("notice=cooldown&user={}&wait={wait}", encode_component(user))
            }
            Notice::SchemaMismatch { column } => {
                format!("notice=schema&column={}", encode_component(column))
            }
            Notice::Failed { user } => format!("notice=failed&user={}", encode_component(user)),
        }
    }

    fn render(&self) -> String {
        let (kind, body) = match self {
            Notice::Recorded { user, drink } => (
                "ok",
                format!(
                    "{} counted for {}!",
                    match drink {
                        DrinkKind::Coffee => "Coffee",
                        DrinkKind::Tea => "Tea",
                    },
                    escape_html(user)
                ),
            ),
            Notice::Cooldown { user, wait } => (
                "warn",
                format!("Wait {wait}s before adding another one for {}!", escape_html(user)),
            ),
            Notice::SchemaMismatch { column } => (
                "error",
                format!(
                    "<strong>Database update required.</strong> {}",
                    escape_html(&remediation(column))
                ),
            ),
            Notice::Failed { user } => (
                "error",
                format!(
                    "Could not save the drink for {}. The event store is not reachable right now.",
                    escape_html(user)
                ),
            ),
        };
        format!(r#"<div class="notice" data-type="{kind}">{body}</div>"#)
    }
}

pub fn render_index(
    config: &Config,
    scores: &ScoresResponse,
    notice: Option<&Notice>,
    quote: &str,
) -> String {
    let cards: String = scores
        .users
        .iter()
        .map(|score| {
            let name = escape_html(&score.user);
            let path = encode_component(&score.user);
            format!(
                r#"
      <div class="user-card">
        <div class="stat">
          <span class="label">{name} (coffee)</span>
          <span class="value" data-user="{name}" data-drink="coffee">{coffee}</span>
        </div>
        <form method="post" action="/click/{path}/coffee">
          <button class="btn-coffee" type="submit">{name} took a coffee</button>
        </form>
        <div class="stat">
          <span class="label">{name} (tea)</span>
          <span class="value" data-user="{name}" data-drink="tea">{tea}</span>
        </div>
        <form method="post" action="/click/{path}/tea">
          <button class="btn-tea" type="submit">{name} took a tea</button>
        </form>
      </div>"#,
                coffee = score.coffee,
                tea = score.tea,
            )
        })
        .collect();

    let cooldown = config.cooldown.num_seconds();
    INDEX_HTML
        .replace("{{NOTICE}}", &notice.map(Notice::render).unwrap_or_default())
        .replace("{{QUOTE}}", &escape_html(quote))
        .replace("{{USER_CARDS}}", &cards)
        .replace("{{TOTAL_COFFEE}}", &scores.total_coffee.to_string())
        .replace("{{TOTAL_TEA}}", &scores.total_tea.to_string())
        .replace("{{COOLDOWN}}", &cooldown.to_string())
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encodes everything outside the URL unreserved set.
pub fn encode_component(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Coffee is my best friend</title>
  <style>
    :root {
      --bg: #f9f3e3;
      --ink: #4a3b32;
      --ink-dark: #2c1a11;
      --bean: #4a3b32;
      --roast: #6f4e37;
      --cream: #ddc7a0;
      --card: rgba(255, 255, 255, 0.7);
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
      width: min(960px, 100%);
      display: grid;
      gap: 28px;
    }

    h1, h2, h3 {
      margin: 0;
      color: var(--ink-dark);
    }

    .subtitle {
      margin: 6px 0 0;
    }

    .quote {
      background: var(--card);
      border-left: 4px solid var(--roast);
      border-radius: 12px;
      padding: 14px 18px;
      font-style: italic;
    }

    .users {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
    }

    .user-card {
      display: grid;
      gap: 10px;
    }

    .stat {
      background: white;
      border-radius: 16px;
      padding: 14px 16px;
      display: grid;
      gap: 6px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: #000;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: #000;
    }

    button {
      appearance: none;
      border: none;
      border-radius: 20px;
      padding: 12px 16px;
      width: 100%;
      font-size: 0.95rem;
      font-weight: 600;
      cursor: pointer;
      background: var(--bean);
      color: white;
    }

    button:hover {
      background: var(--roast);
    }

    .totals {
      text-align: center;
    }

    .notice {
      border-radius: 12px;
      padding: 12px 16px;
      color: var(--ink-dark);
    }

    .notice[data-type="ok"] {
      background: #d8f0dc;
    }

    .notice[data-type="warn"] {
      background: #fbe8b8;
    }

    .notice[data-type="error"] {
      background: #f6cfc8;
    }

    .analytics {
      display: grid;
      gap: 16px;
    }

    .tabs {
      display: flex;
      gap: 6px;
    }

    .tab {
      width: auto;
      background: transparent;
      color: var(--ink);
      border-radius: 999px;
      padding: 8px 14px;
    }

    .tab.active {
      background: var(--cream);
      color: var(--ink-dark);
    }

    .chart-card {
      background: var(--cream);
      border-radius: 20px;
      padding: 16px;
    }

    .chart {
      width: 100%;
      height: 300px;
      display: block;
    }

    .chart-grid {
      stroke: rgba(0, 0, 0, 0.35);
    }

    .chart-label {
      fill: var(--ink);
      font-size: 11px;
    }

    .legend {
      display: flex;
      flex-wrap: wrap;
      gap: 14px;
      margin-top: 8px;
      font-size: 0.9rem;
    }

    .legend span::before {
      content: "";
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 50%;
      margin-right: 6px;
      background: var(--swatch);
    }

    .share {
      display: grid;
      gap: 8px;
    }

    .share-row {
      display: grid;
      grid-template-columns: 120px 1fr 90px;
      align-items: center;
      gap: 10px;
    }

    .share-bar {
      height: 14px;
      border-radius: 7px;
      background: var(--swatch);
    }

    .empty {
      font-style: italic;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.9rem;
    }

    th, td {
      text-align: left;
      padding: 4px 8px;
      border-bottom: 1px solid rgba(74, 59, 50, 0.2);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Coffee is my best friend</h1>
      <p class="subtitle">Yes. This is actually happening.</p>
    </header>

    {{NOTICE}}

    <div class="quote">{{QUOTE}}</div>

    <section>
      <h2>Coffee counter</h2>
      <p class="subtitle">One click per person every {{COOLDOWN}} seconds.</p>
    </section>

    <section class="users">{{USER_CARDS}}
    </section>

    <h3 class="totals">Totals: {{TOTAL_COFFEE}} coffees | {{TOTAL_TEA}} teas</h3>

    <section class="analytics" id="coffee-analytics">
      <h2>Coffee analytics</h2>
      <div class="body"><p class="empty">Loading...</p></div>
    </section>

    <section class="analytics" id="tea-analytics">
      <h2>Tea analytics</h2>
      <div class="body"><p class="empty">Loading...</p></div>
    </section>

    <details id="raw-data">
      <summary>Show raw data</summary>
      <table>
        <thead><tr><th>When</th><th>User</th><th>Drink</th><th>Value</th></tr></thead>
        <tbody></tbody>
      </table>
    </details>
  </main>

  <script>
    const PALETTE = ['#1f77b4', '#ff7f0e', 'rebeccapurple', '#2ca02c', '#d62728', '#8c564b', '#17becf'];
    const PERIOD_TITLES = { week: 'This week (Mon-Sun)', month: 'This month', year: 'This year' };

    const colorFor = (() => {
      const assigned = new Map();
      return (name) => {
        if (!assigned.has(name)) {
          assigned.set(name, PALETTE[assigned.size % PALETTE.length]);
        }
        return assigned.get(name);
      };
    })();

    const escapeText = (value) =>
      String(value).replace(/[&<>"']/g, (c) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[c]));

    const renderChart = (svg, series) => {
      const width = 640;
      const height = 300;
      const paddingX = 44;
      const paddingY = 34;
      const top = 20;
      const count = series.buckets.length;

      const max = Math.max(series.columns.reduce((acc, column) =>
        Math.max(acc, ...column.values.filter((v) => v !== null)), 0), 0);
      const yMax = max > 0 ? max * 1.1 : 5;
      const xStep = count > 1 ? (width - paddingX * 2) / (count - 1) : 0;
      const x = (index) => paddingX + index * xStep;
      const y = (value) => height - paddingY - (value / yMax) * (height - top - paddingY);

      let grid = '';
      const ticks = 4;
      for (let i = 0; i <= ticks; i += 1) {
        const value = (yMax * i) / ticks;
        grid += `<line class="chart-grid" x1="${paddingX}" y1="${y(value)}" x2="${width - paddingX}" y2="${y(value)}" />`;
        grid += `<text class="chart-label" x="${paddingX - 8}" y="${y(value) + 4}" text-anchor="end">${Math.round(value * 10) / 10}</text>`;
      }

      const labelEvery = Math.max(1, Math.ceil(count / 8));
      const xLabels = series.buckets
        .map((bucket, index) => index % labelEvery === 0
          ? `<text class="chart-label" x="${x(index)}" y="${height - paddingY + 18}" text-anchor="middle">${bucket.slice(5)}</text>`
          : '')
        .join('');

      const lines = series.columns.map((column) => {
        const color = colorFor(column.name);
        let path = '';
        let pen = 'M';
        column.values.forEach((value, index) => {
          if (value === null) {
            pen = 'M';
            return;
          }
          path += `${pen} ${x(index).toFixed(2)} ${y(value).toFixed(2)} `;
          pen = 'L';
        });
        const points = count <= 31
          ? column.values
            .map((value, index) => value === null ? '' : `<circle cx="${x(index)}" cy="${y(value)}" r="3" fill="${color}" />`)
            .join('')
          : '';
        return `<path d="${path}" fill="none" stroke="${color}" stroke-width="3" />${points}`;
      }).join('');

      svg.setAttribute('viewBox', `0 0 ${width} ${height}`);
      svg.innerHTML = `${grid}${lines}${xLabels}`;
    };

    const renderShare = (container, share) => {
      container.innerHTML = share.map((slice) => `
        <div class="share-row" style="--swatch: ${colorFor(slice.name)}">
          <span>${escapeText(slice.name)}</span>
          <div class="share-bar" style="width: ${(slice.percentage * 100).toFixed(1)}%"></div>
          <span>${slice.count} (${(slice.percentage * 100).toFixed(1)}%)</span>
        </div>`).join('');
    };

    const renderDrink = (section, stats, emptyMessage) => {
      const body = section.querySelector('.body');
      if (!stats) {
        body.innerHTML = `<p class="empty">${emptyMessage}</p>`;
        return;
      }

      body.innerHTML = `
        <h3>Share</h3>
        <div class="share"></div>
        <div class="tabs" role="tablist"></div>
        <div class="chart-card">
          <h3 class="chart-title"></h3>
          <svg class="chart" role="img"></svg>
          <div class="legend"></div>
        </div>`;

      renderShare(body.querySelector('.share'), stats.share);

      const tabs = body.querySelector('.tabs');
      const svg = body.querySelector('.chart');
      const title = body.querySelector('.chart-title');
      const legend = body.querySelector('.legend');

      const show = (index) => {
        const span = stats.windows[index];
        title.textContent = `${PERIOD_TITLES[span.period]} (${span.start_date} to ${span.end_date})`;
        renderChart(svg, span.series);
        legend.innerHTML = span.series.columns
          .map((column) => `<span style="--swatch: ${colorFor(column.name)}">${escapeText(column.name)}</span>`)
          .join('');
        tabs.querySelectorAll('.tab').forEach((tab, i) => tab.classList.toggle('active', i === index));
      };

      stats.windows.forEach((span, index) => {
        const tab = document.createElement('button');
        tab.type = 'button';
        tab.className = 'tab';
        tab.textContent = span.period;
        tab.addEventListener('click', () => show(index));
        tabs.appendChild(tab);
      });
      show(0);
    };

    const loadStats = async () => {
      const res = await fetch('/api/stats');
      if (!res.ok) {
        throw new Error('Unable to load stats');
      }
      const stats = await res.json();
      renderDrink(document.getElementById('coffee-analytics'), stats.coffee, 'No coffee data yet! Click a button to start the history.');
      renderDrink(document.getElementById('tea-analytics'), stats.tea, 'No tea data found yet. Drink some tea!');
    };

    const rawData = document.getElementById('raw-data');
    rawData.addEventListener('toggle', async () => {
      if (!rawData.open) {
        return;
      }
      const res = await fetch('/api/events');
      const events = res.ok ? await res.json() : [];
      rawData.querySelector('tbody').innerHTML = events.map((event) => `
        <tr>
          <td>${escapeText(event.created_at)}</td>
          <td>${escapeText(event.user_name)}</td>
          <td>${escapeText(event.drink_kind)}</td>
          <td>${event.value}</td>
        </tr>`).join('');
    });

    loadStats().catch((err) => {
      document.querySelectorAll('.analytics .body').forEach((body) => {
        body.innerHTML = `<p class="empty">${escapeText(err.message)}</p>`;
      });
    });
  </script>
</body>
</html>
"#;
