//! Parameterized query templates for change extraction.
//!
//! Three shapes, per the extraction design:
//! - the work-rooted join for `film_work` changes,
//! - a single-table watermark scan for the related sources,
//! - a root re-resolution join that rebuilds the same row shape for film
//!   works affected by related-table changes.
//!
//! All values are bound through placeholders; only table names drawn from
//! the `Source` enum are interpolated.

use movies_etl_shared::Source;

/// Aggregated select list shared by the root-shaped queries.
///
/// `modified_expr` is `fw.modified` for the film_work path and
/// `MAX(<related>.modified)` for re-resolution; `predicate` filters either by
/// watermark (strictly greater, so a row exactly at the watermark is never
/// re-extracted) or by affected root ids.
fn film_select(modified_expr: &str, predicate: &str) -> String {
    format!(
        "SELECT fw.id, fw.title, fw.description, fw.rating, \
         ARRAY_AGG(DISTINCT g.name) FILTER (WHERE g.name IS NOT NULL) AS genres, \
         {directors}, \
         {actors}, \
         {writers}, \
         {modified} AS modified \
         FROM content.film_work fw \
         LEFT JOIN content.genre_film_work gfw ON gfw.film_work_id = fw.id \
         LEFT JOIN content.genre g ON g.id = gfw.genre_id \
         LEFT JOIN content.person_film_work pfw ON pfw.film_work_id = fw.id \
         LEFT JOIN content.person p ON p.id = pfw.person_id \
         WHERE {predicate} \
         GROUP BY fw.id \
         ORDER BY modified",
        directors = role_agg("director", "directors"),
        actors = role_agg("actor", "actors"),
        writers = role_agg("writer", "writers"),
        modified = modified_expr,
        predicate = predicate,
    )
}

fn role_agg(role: &str, alias: &str) -> String {
    format!(
        "JSONB_AGG(DISTINCT jsonb_build_object('id', p.id, 'name', p.full_name)) \
         FILTER (WHERE pfw.role = '{role}') AS {alias}",
        role = role,
        alias = alias,
    )
}

/// Film works modified past the watermark, with genres and role-partitioned
/// person lists aggregated in, ordered ascending by `modified`.
pub fn changed_roots(/* $1 = watermark */) -> String {
    film_select("fw.modified", "fw.modified > $1")
}

/// Phase 1 for related sources: ids of rows in the source's own table
/// modified past the watermark, one bounded page at a time.
pub fn related_scan(source: Source /* $1 = watermark, $2 = page size */) -> String {
    format!(
        "SELECT id FROM content.{table} WHERE modified > $1 ORDER BY modified LIMIT $2",
        table = source.table(),
    )
}

/// Phase 2 for related sources: film works linked to the changed rows.
pub fn affected_roots(source: Source /* $1 = changed related ids */) -> String {
    format!(
        "SELECT DISTINCT fw.id \
         FROM content.film_work fw \
         JOIN content.{table}_film_work link ON link.film_work_id = fw.id \
         WHERE link.{table}_id = ANY($1)",
        table = source.table(),
    )
}

/// Phase 3 for related sources: re-resolve the affected film works into the
/// root row shape, with `modified` replaced by the maximum `modified` among
/// the contributing related-table rows.
///
/// The MAX is restricted to the ids phase 1 actually scanned. An unbounded
/// MAX over all of a film's related rows could pick up a row beyond the
/// current page and push the persisted watermark past rows the page never
/// reached, so those rows would never be extracted.
pub fn root_resolution(
    source: Source, /* $1 = affected film work ids, $2 = scanned related ids */
) -> String {
    let modified_expr = match source {
        // film_work goes through `changed_roots` instead.
        Source::FilmWork => "fw.modified",
        Source::Genre => "MAX(g.modified) FILTER (WHERE g.id = ANY($2))",
        Source::Person => "MAX(p.modified) FILTER (WHERE p.id = ANY($2))",
    };
    film_select(modified_expr, "fw.id = ANY($1)")
}
