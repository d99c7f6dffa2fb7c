use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{
    models::{Link, Section},
    services::{links, sections, settings},
    web::{
        AppState,
        templates::{escape_html, icon_glyph, render_profile_header, render_public_page},
    },
};

const CLICK_BEACON_SCRIPT: &str = r#"<script>
        document.querySelectorAll('a[data-link-id]').forEach((card) => {
            card.addEventListener('click', () => {
                const url = `/api/links/${card.dataset.linkId}/click`;
                if (navigator.sendBeacon) {
                    navigator.sendBeacon(url);
                } else {
                    fetch(url, { method: 'POST', keepalive: true }).catch(() => {});
                }
            });
        });
    </script>"#;

pub async fn home_page(State(state): State<AppState>) -> Html<String> {
    let pool = state.pool_ref();
    let (site, visible) = tokio::join!(
        settings::load_or_default(pool),
        sections::get_visible(pool)
    );

    let header = render_profile_header(
        &site.site_title,
        &site.site_description,
        if site.profile_initial.is_empty() {
            "M"
        } else {
            site.profile_initial.as_str()
        },
        Some(site.profile_image_url.as_str()),
    );

    let cards = if visible.is_empty() {
        r#"<div class="empty"><p>No sections available yet.</p><a href="/admin">Add sections in the admin panel</a></div>"#
            .to_string()
    } else {
        let items = visible
            .iter()
            .map(render_section_card)
            .collect::<String>();
        format!(r#"<div class="cards">{items}</div>"#)
    };

    Html(render_public_page(
        &site.site_title,
        &site.site_description,
        &format!("{header}\n{cards}"),
    ))
}

pub async fn section_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let pool = state.pool_ref();
    let Some(section) = sections::get_by_slug(pool, &slug).await else {
        return not_found_page();
    };

    let visible = links::get_visible_by_section(pool, section.id).await;
    let description = section
        .description
        .clone()
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| link_count_label(visible.len()));

    let header = render_profile_header(
        &section.title,
        &description,
        &section_initial(&section),
        section.profile_image_url.as_deref(),
    );

    let body = if visible.is_empty() {
        r#"<p class="empty">No links in this section yet.</p>"#.to_string()
    } else {
        group_links(&visible)
            .into_iter()
            .map(|(title, members)| render_link_group(title, &members))
            .collect::<String>()
    };

    let meta_description = section
        .description
        .clone()
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| format!("Links for {}", section.title));

    Html(render_public_page(
        &section.title,
        &meta_description,
        &format!(
            "<a class=\"back-link\" href=\"/\">\u{2190} Back to Home</a>\n{header}\n{body}\n{CLICK_BEACON_SCRIPT}"
        ),
    ))
    .into_response()
}

/// Buckets links by `group_title`, keeping the order in which each group first appears.
pub fn group_links(links: &[Link]) -> Vec<(Option<&str>, Vec<&Link>)> {
    let mut groups: Vec<(Option<&str>, Vec<&Link>)> = Vec::new();
    for link in links {
        let key = link.group_title.as_deref();
        match groups.iter_mut().find(|(title, _)| *title == key) {
            Some((_, members)) => members.push(link),
            None => groups.push((key, vec![link])),
        }
    }
    groups
}

fn section_initial(section: &Section) -> String {
    section
        .profile_initial
        .clone()
        .filter(|initial| !initial.is_empty())
        .unwrap_or_else(|| {
            section
                .title
                .chars()
                .next()
                .map(|first| first.to_uppercase().collect())
                .unwrap_or_default()
        })
}

fn link_count_label(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} link{plural} available")
}

fn render_section_card(section: &Section) -> String {
    format!(
        r#"<a class="card" href="/{slug}"><span class="glyph">{glyph}</span><span class="text"><h2>{title}</h2><small>/{slug}</small></span><span>&rsaquo;</span></a>"#,
        slug = escape_html(&section.slug),
        title = escape_html(&section.title),
        glyph = icon_glyph("folder"),
    )
}

fn render_link_group(title: Option<&str>, members: &[&Link]) -> String {
    let heading = title
        .map(|title| format!(r#"<h2 class="group-title">{}</h2>"#, escape_html(title)))
        .unwrap_or_default();
    let cards = members
        .iter()
        .map(|link| {
            format!(
                r#"<a class="card" href="{url}" target="_blank" rel="noopener noreferrer" data-link-id="{id}"><span class="glyph">{glyph}</span><span class="text"><h3>{label}</h3><small>{url}</small></span><span>&#8599;</span></a>"#,
                url = escape_html(&link.url),
                id = link.id,
                glyph = icon_glyph(&link.icon_type),
                label = escape_html(&link.label),
            )
        })
        .collect::<String>();

    format!(r#"<section>{heading}<div class="cards">{cards}</div></section>"#)
}

fn not_found_page() -> Response {
    let body = r#"<div class="empty"><h1>Not Found</h1><p>This page does not exist.</p><a href="/">Back to Home</a></div>"#;
    (
        StatusCode::NOT_FOUND,
        Html(render_public_page("Not Found", "Page not found", body)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn link(id: i64, group: Option<&str>) -> Link {
        Link {
            id,
            section_id: 1,
            label: format!("L{id}"),
            url: "https://example.com".to_string(),
            icon_type: "link".to_string(),
            is_visible: true,
            display_order: id,
            clicks: 0,
            group_title: group.map(str::to_string),
            group_order: 0,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let links = [
            link(1, Some("Social")),
            link(2, None),
            link(3, Some("Social")),
            link(4, Some("Work")),
            link(5, None),
        ];
        let groups = group_links(&links);
        let shape: Vec<(Option<&str>, Vec<i64>)> = groups
            .iter()
            .map(|(title, members)| (*title, members.iter().map(|l| l.id).collect()))
            .collect();
        assert_eq!(
            shape,
            [
                (Some("Social"), vec![1, 3]),
                (None, vec![2, 5]),
                (Some("Work"), vec![4]),
            ]
        );
    }

    #[test]
    fn initial_falls_back_to_upper_cased_title() {
        let mut section = Section {
            id: 1,
            title: "écrits".to_string(),
            slug: "ecrits".to_string(),
            show_in_main: true,
            display_order: 0,
            description: None,
            profile_initial: None,
            profile_image_url: None,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        };
        assert_eq!(section_initial(&section), "É");

        section.profile_initial = Some("Z".to_string());
        assert_eq!(section_initial(&section), "Z");
        assert_eq!(link_count_label(1), "1 link available");
        assert_eq!(link_count_label(0), "0 links available");
    }
}
