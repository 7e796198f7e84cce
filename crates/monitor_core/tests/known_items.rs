use monitor_core::{KnownItemSet, ListingParser};
use url::Url;

const PAGE: &str = r#"
<table>
  <tr id="101"><td><a href="/t/101/">One</a></td><td>2024-04-01 09:00:00</td></tr>
  <tr id="102"><td><a href="/t/102/">Two</a></td><td>2024-04-01 10:00:00</td></tr>
  <tr id="103"><td><a href="/t/103/">Three</a></td><td>2024-04-01 11:00:00</td></tr>
</table>
"#;

fn parser() -> ListingParser {
    ListingParser::new(Url::parse("https://site.test/").unwrap())
}

#[test]
fn unchanged_page_yields_empty_second_delta() {
    let parser = parser();
    let mut known = KnownItemSet::new();

    let first = known.absorb(&parser.parse(PAGE).items);
    assert_eq!(first.len(), 3);

    let second = known.absorb(&parser.parse(PAGE).items);
    assert!(second.is_empty());
}

#[test]
fn previously_known_ids_are_never_reintroduced() {
    let mut known: KnownItemSet = ["102"].into_iter().collect();

    let delta = known.absorb(&parser().parse(PAGE).items);
    let ids: Vec<&str> = delta.new_items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["101", "103"]);
    assert!(known.contains("101") && known.contains("102") && known.contains("103"));
}

#[test]
fn title_drift_does_not_make_an_item_new() {
    let mut known = KnownItemSet::new();
    known.absorb(&parser().parse(PAGE).items);

    let drifted = PAGE.replace(">Two<", ">Two (re-uploaded)<");
    assert!(known.absorb(&parser().parse(&drifted).items).is_empty());
}
