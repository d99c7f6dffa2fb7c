use axum::{
    extract::State,
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::{
    models::{AVAILABLE_ICONS, Link, Section, Settings},
    services::{
        links::{self, LinkFilter},
        sections, settings,
        stats::{self, DashboardStats},
    },
    web::{AppState, escape_html, render_footer},
};

use super::auth::require_admin_page;

const DASHBOARD_STYLES: &str = r#"
        :root { color-scheme: light; }
        body { font-family: "Helvetica Neue", Arial, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }
        header { background: #ffffff; padding: 1.5rem; border-bottom: 1px solid #e2e8f0; display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; gap: 1rem; }
        header h1 { margin: 0; font-size: 1.5rem; }
        header nav { display: flex; gap: 0.75rem; align-items: center; }
        header a { color: #4f46e5; font-weight: 600; text-decoration: none; }
        main { padding: 2rem 1.5rem; max-width: 1100px; margin: 0 auto; box-sizing: border-box; }
        section.panel { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; margin-bottom: 2rem; box-shadow: 0 18px 40px rgba(15, 23, 42, 0.06); }
        section.panel h2 { margin-top: 0; }
        .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 1rem; margin-bottom: 2rem; }
        .stat { background: #ffffff; border: 1px solid #e2e8f0; border-radius: 12px; padding: 1.25rem; }
        .stat strong { display: block; font-size: 1.8rem; }
        .stat span { color: #64748b; }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 0.6rem 0.75rem; border-bottom: 1px solid #e2e8f0; text-align: left; font-size: 0.92rem; vertical-align: middle; }
        th { background: #f1f5f9; }
        td input[type="number"] { width: 4.5rem; }
        form.inline { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 0.75rem; margin-top: 1rem; align-items: end; }
        label { display: flex; flex-direction: column; gap: 0.35rem; font-weight: 600; font-size: 0.9rem; }
        input, select { padding: 0.55rem; border-radius: 8px; border: 1px solid #cbd5f5; background: #f8fafc; color: #0f172a; }
        label.check { flex-direction: row; align-items: center; }
        button { padding: 0.6rem 1rem; border: none; border-radius: 8px; background: #4f46e5; color: #ffffff; font-weight: 600; cursor: pointer; }
        button.danger { background: #dc2626; }
        button.ghost { background: #e2e8f0; color: #0f172a; }
        .muted { color: #64748b; }
        #toasts { position: fixed; right: 1rem; bottom: 1rem; display: flex; flex-direction: column; gap: 0.5rem; z-index: 50; }
        .toast { padding: 0.75rem 1rem; border-radius: 10px; color: #ffffff; background: #0f172a; box-shadow: 0 10px 30px rgba(15, 23, 42, 0.2); }
        .toast.error { background: #b91c1c; }
        .toast.success { background: #166534; }
        .app-footer { margin-top: 3rem; text-align: center; font-size: 0.85rem; color: #94a3b8; }
"#;

const DASHBOARD_SCRIPT: &str = r#"<script>
        class Toaster {
            constructor(root) {
                this.root = root;
                this.nextId = 0;
            }
            show(message, kind = 'success') {
                const id = ++this.nextId;
                const node = document.createElement('div');
                node.className = 'toast ' + kind;
                node.dataset.toastId = String(id);
                node.textContent = message;
                this.root.appendChild(node);
                setTimeout(() => node.remove(), 3500);
                return id;
            }
        }
        const toaster = new Toaster(document.getElementById('toasts'));

        async function api(method, url, body) {
            const response = await fetch(url, {
                method,
                headers: { 'Content-Type': 'application/json' },
                body: body === undefined ? undefined : JSON.stringify(body),
            });
            if (response.status === 401) {
                window.location.href = '/login';
                return null;
            }
            return response.json();
        }

        async function submit(method, url, body) {
            let payload = await api(method, url, body);
            if (payload && payload.warning) {
                if (!window.confirm(payload.message)) {
                    toaster.show('Order unchanged', 'error');
                    return;
                }
                payload = await api(method, url, { ...body, confirmSwap: true });
            }
            if (!payload) return;
            if (payload.success) {
                toaster.show('Saved');
                setTimeout(() => window.location.reload(), 400);
            } else {
                toaster.show(payload.error || 'Request failed', 'error');
            }
        }

        function formBody(form) {
            const body = {};
            for (const element of form.elements) {
                if (!element.name) continue;
                if (element.type === 'checkbox') {
                    body[element.name] = element.checked;
                } else if (element.type === 'number') {
                    if (element.value !== '') body[element.name] = Number(element.value);
                } else {
                    body[element.name] = element.value;
                }
            }
            return body;
        }

        document.querySelectorAll('form[data-endpoint]').forEach((form) => {
            form.addEventListener('submit', (event) => {
                event.preventDefault();
                submit(form.dataset.method || 'POST', form.dataset.endpoint, formBody(form));
            });
        });

        document.querySelectorAll('input[data-order-endpoint]').forEach((input) => {
            input.addEventListener('change', () => {
                submit('PUT', input.dataset.orderEndpoint, { display_order: Number(input.value) });
            });
        });

        document.querySelectorAll('input[data-toggle-endpoint]').forEach((input) => {
            input.addEventListener('change', () => {
                submit('PUT', input.dataset.toggleEndpoint, { [input.dataset.field]: input.checked });
            });
        });

        document.querySelectorAll('button[data-delete-endpoint]').forEach((button) => {
            button.addEventListener('click', () => {
                if (window.confirm('Delete "' + button.dataset.name + '"?')) {
                    submit('DELETE', button.dataset.deleteEndpoint);
                }
            });
        });

        document.getElementById('logout').addEventListener('click', async () => {
            await api('POST', '/api/auth/logout');
            window.location.href = '/login';
        });
    </script>"#;

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    require_admin_page(&state, &jar)?;

    let pool = state.pool_ref();
    let (stats, all_sections, all_links, site) = tokio::join!(
        stats::dashboard(pool),
        sections::find_all(pool, false),
        links::find_all(pool, LinkFilter::default()),
        settings::load_or_default(pool),
    );

    let stats = stats.unwrap_or_else(|err| {
        error!(?err, "failed to load dashboard stats");
        DashboardStats {
            sections_count: 0,
            links_count: 0,
            total_clicks: 0,
            top_links: Vec::new(),
        }
    });
    let all_sections = all_sections.unwrap_or_else(|err| {
        error!(?err, "failed to load sections for dashboard");
        Vec::new()
    });
    let all_links = all_links.unwrap_or_else(|err| {
        error!(?err, "failed to load links for dashboard");
        Vec::new()
    });

    Ok(Html(render_dashboard(&stats, &all_sections, &all_links, &site)))
}

fn render_dashboard(
    stats: &DashboardStats,
    all_sections: &[Section],
    all_links: &[Link],
    site: &Settings,
) -> String {
    let top_rows = if stats.top_links.is_empty() {
        r#"<tr><td colspan="2" class="muted">No clicks yet.</td></tr>"#.to_string()
    } else {
        stats
            .top_links
            .iter()
            .map(|link| {
                format!(
                    "<tr><td>{label}</td><td>{clicks}</td></tr>",
                    label = escape_html(&link.label),
                    clicks = link.clicks
                )
            })
            .collect()
    };

    let section_rows = if all_sections.is_empty() {
        r#"<tr><td colspan="5" class="muted">No sections yet.</td></tr>"#.to_string()
    } else {
        all_sections.iter().map(render_section_row).collect()
    };

    let link_rows = if all_links.is_empty() {
        r#"<tr><td colspan="6" class="muted">No links yet.</td></tr>"#.to_string()
    } else {
        all_links
            .iter()
            .map(|link| render_link_row(link, all_sections))
            .collect()
    };

    let section_options = all_sections
        .iter()
        .map(|section| {
            format!(
                r#"<option value="{id}">{title}</option>"#,
                id = section.id,
                title = escape_html(&section.title)
            )
        })
        .collect::<String>();

    let icon_options = AVAILABLE_ICONS
        .iter()
        .map(|icon| format!(r#"<option value="{icon}">{icon}</option>"#))
        .collect::<String>();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Admin dashboard</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
{styles}
    </style>
</head>
<body>
    <header>
        <h1>Admin dashboard</h1>
        <nav><a href="/" target="_blank">View site</a><button type="button" class="ghost" id="logout">Log out</button></nav>
    </header>
    <main>
        <div class="stats">
            <div class="stat"><strong>{sections_count}</strong><span>Sections</span></div>
            <div class="stat"><strong>{links_count}</strong><span>Links</span></div>
            <div class="stat"><strong>{total_clicks}</strong><span>Total clicks</span></div>
        </div>
        <section class="panel">
            <h2>Top links</h2>
            <table><thead><tr><th>Link</th><th>Clicks</th></tr></thead><tbody>{top_rows}</tbody></table>
        </section>
        <section class="panel">
            <h2>Sections</h2>
            <table><thead><tr><th>Order</th><th>Title</th><th>Slug</th><th>On home</th><th></th></tr></thead><tbody>{section_rows}</tbody></table>
            <form class="inline" data-endpoint="/api/sections">
                <label>Title<input name="title" maxlength="100" required></label>
                <label>Slug<input name="slug" maxlength="50" pattern="[a-z0-9]+(-[a-z0-9]+)*" required></label>
                <label>Order<input name="display_order" type="number" min="0" value="0"></label>
                <label>Description<input name="description" maxlength="500"></label>
                <label class="check"><input name="show_in_main" type="checkbox" checked> Show on home</label>
                <button type="submit">Add section</button>
            </form>
        </section>
        <section class="panel">
            <h2>Links</h2>
            <table><thead><tr><th>Order</th><th>Label</th><th>Section</th><th>Group</th><th>Visible</th><th></th></tr></thead><tbody>{link_rows}</tbody></table>
            <form class="inline" data-endpoint="/api/links">
                <label>Section<select name="section_id">{section_options}</select></label>
                <label>Label<input name="label" maxlength="100" required></label>
                <label>URL<input name="url" type="url" maxlength="2000" required></label>
                <label>Icon<select name="icon_type">{icon_options}</select></label>
                <label>Group<input name="group_title" maxlength="100"></label>
                <label>Group order<input name="group_order" type="number" min="0" value="0"></label>
                <label>Order<input name="display_order" type="number" min="0" value="0"></label>
                <label class="check"><input name="is_visible" type="checkbox" checked> Visible</label>
                <button type="submit">Add link</button>
            </form>
        </section>
        <section class="panel">
            <h2>Settings</h2>
            <form class="inline" data-endpoint="/api/settings" data-method="PUT">
                <label>Site title<input name="site_title" maxlength="100" value="{site_title}" required></label>
                <label>Description<input name="site_description" maxlength="500" value="{site_description}"></label>
                <label>Initial<input name="profile_initial" maxlength="1" value="{profile_initial}"></label>
                <label>Image URL (https)<input name="profile_image_url" value="{profile_image_url}"></label>
                <button type="submit">Save settings</button>
            </form>
        </section>
        {footer}
    </main>
    <div id="toasts"></div>
{script}
</body>
</html>"#,
        styles = DASHBOARD_STYLES,
        sections_count = stats.sections_count,
        links_count = stats.links_count,
        total_clicks = stats.total_clicks,
        site_title = escape_html(&site.site_title),
        site_description = escape_html(&site.site_description),
        profile_initial = escape_html(&site.profile_initial),
        profile_image_url = escape_html(&site.profile_image_url),
        footer = render_footer(),
        script = DASHBOARD_SCRIPT,
    )
}

fn render_section_row(section: &Section) -> String {
    let endpoint = format!("/api/sections/{}", section.id);
    format!(
        r#"<tr><td><input type="number" min="0" value="{order}" data-order-endpoint="{endpoint}"></td><td>{title}</td><td><a href="/{slug}" target="_blank">/{slug}</a></td><td><input type="checkbox" data-toggle-endpoint="{endpoint}" data-field="show_in_main"{checked}></td><td><button type="button" class="danger" data-delete-endpoint="{endpoint}" data-name="{title}">Delete</button></td></tr>"#,
        order = section.display_order,
        title = escape_html(&section.title),
        slug = escape_html(&section.slug),
        checked = if section.show_in_main { " checked" } else { "" },
    )
}

fn render_link_row(link: &Link, all_sections: &[Section]) -> String {
    let endpoint = format!("/api/links/{}", link.id);
    let section_title = all_sections
        .iter()
        .find(|section| section.id == link.section_id)
        .map(|section| escape_html(&section.title))
        .unwrap_or_default();

    format!(
        r#"<tr><td><input type="number" min="0" value="{order}" data-order-endpoint="{endpoint}"></td><td><a href="{url}" target="_blank" rel="noopener noreferrer">{label}</a> <span class="muted">({clicks})</span></td><td>{section_title}</td><td>{group}</td><td><input type="checkbox" data-toggle-endpoint="{endpoint}" data-field="is_visible"{checked}></td><td><button type="button" class="danger" data-delete-endpoint="{endpoint}" data-name="{label}">Delete</button></td></tr>"#,
        order = link.display_order,
        url = escape_html(&link.url),
        label = escape_html(&link.label),
        clicks = link.clicks,
        group = link.group_title.as_deref().map(escape_html).unwrap_or_default(),
        checked = if link.is_visible { " checked" } else { "" },
    )
}
