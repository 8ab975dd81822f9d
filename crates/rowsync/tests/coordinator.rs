//! Integration tests driving an `UpdateCoordinator` with a recording host.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rowsync::model::{
    Address, AnyItem, BatchRejected, CellRenderer, CellType, CoordinatorOwner, EditScript,
    HostView, SectionModel, UpdateCoordinator,
};
use rowsync::{CoordinatorConfig, Error};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("rowsync=debug,rowsync_core=debug")
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct RecordingHost {
    events: Mutex<Vec<String>>,
    batches: Mutex<Vec<EditScript>>,
    cells: Mutex<Vec<(String, &'static str)>>,
    reject: AtomicBool,
}

impl RecordingHost {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn last_batch(&self) -> Option<EditScript> {
        self.batches.lock().last().cloned()
    }
}

impl HostView for RecordingHost {
    fn register_cell(&self, reuse_id: &str, cell_type: CellType) {
        self.cells
            .lock()
            .push((reuse_id.to_string(), cell_type.type_name()));
    }

    fn reload_section(&self, section: usize) {
        self.events.lock().push(format!("reload {section}"));
    }

    fn apply_batch(&self, batch: &EditScript) -> Result<(), BatchRejected> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(BatchRejected::new("host is mid-animation"));
        }
        self.events.lock().push(batch.to_string());
        self.batches.lock().push(batch.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Contact {
    name: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
struct Ad {
    sponsor: &'static str,
}

#[derive(Default)]
struct ContactCell {
    title: String,
    row: Option<Address>,
}

#[derive(Default)]
struct AdCell {
    banner: String,
}

fn contact(name: &'static str) -> Contact {
    Contact { name }
}

fn coordinator_with_renderers(config: CoordinatorConfig) -> UpdateCoordinator<RecordingHost> {
    let coordinator = UpdateCoordinator::with_config(RecordingHost::default(), config).unwrap();
    coordinator
        .register(
            CellRenderer::<ContactCell, Contact>::new(|cell, contact, address| {
                cell.title = contact.name.to_string();
                cell.row = Some(address);
            })
            .with_reuse_id("contact"),
        )
        .unwrap();
    coordinator
        .register(
            CellRenderer::<AdCell, Ad>::new(|cell, ad, _| {
                cell.banner = format!("Sponsored by {}", ad.sponsor);
            })
            .with_height(|_| 120.0)
            .with_reuse_id("ad"),
        )
        .unwrap();
    coordinator
}

#[test]
fn test_registration_declares_cells_to_host() {
    setup();
    let coordinator = coordinator_with_renderers(CoordinatorConfig::default());

    let cells = coordinator.host().cells.lock().clone();
    assert_eq!(cells.len(), 2);
    assert_eq!(cells[0].0, "contact");
    assert!(cells[0].1.ends_with("ContactCell"));
    assert_eq!(cells[1].0, "ad");

    let err = coordinator
        .register(CellRenderer::<AdCell, Ad>::new(|_, _, _| {}))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateRendererKey { .. }));
    assert_eq!(coordinator.host().cells.lock().len(), 2);
    assert!(coordinator.has_renderer::<Contact>());
    assert!(!coordinator.has_renderer::<String>());
}

#[test]
fn test_batches_follow_replace_order() {
    setup();
    let coordinator = coordinator_with_renderers(CoordinatorConfig::default());
    let section = Arc::new(SectionModel::new(vec![contact("Ada"), contact("Grace")]));
    coordinator.add_section(section.clone());

    let mut mirror: Vec<Contact> = section.items().iter().map(|c| (**c).clone()).collect();
    let updates = [
        vec![contact("Grace")],
        vec![contact("Grace"), contact("Linus"), contact("Ada")],
        vec![contact("Ada"), contact("Grace")],
        vec![],
        vec![contact("Ken")],
    ];

    for update in updates {
        section.replace(update.clone());
        let batch = coordinator.host().last_batch().unwrap();
        batch.apply_to(&mut mirror, &update).unwrap();
        assert_eq!(mirror, update);
        assert_eq!(coordinator.row_count(0).unwrap(), update.len());
    }

    let events = coordinator.host().events();
    assert_eq!(events[0], "reload 0");
    assert_eq!(events.len(), 6);
    assert_eq!(events[1], "[delete section 0, row 0]");
}

#[test]
fn test_sections_are_addressed_independently() {
    setup();
    let coordinator = coordinator_with_renderers(CoordinatorConfig::default());
    let people = Arc::new(SectionModel::new(vec![contact("Ada")]));
    let ads = Arc::new(SectionModel::new(vec![Ad { sponsor: "Acme" }]));

    assert_eq!(coordinator.add_section(people.clone()), 0);
    assert_eq!(coordinator.add_section(ads.clone()), 1);

    ads.push(Ad { sponsor: "Initech" });
    people.remove(0).unwrap();

    let events = coordinator.host().events();
    assert_eq!(
        events,
        vec![
            "reload 0",
            "reload 1",
            "[insert section 1, row 1]",
            "[delete section 0, row 0]",
        ]
    );

    assert_eq!(coordinator.reuse_id_for(Address::new(1, 1)).unwrap(), "ad");
    assert_eq!(coordinator.size_for(Address::new(1, 1)).unwrap(), 120.0);
    assert_eq!(
        coordinator.resolve(Address::new(0, 0)).unwrap_err(),
        Error::invalid_address(Address::new(0, 0))
    );
}

#[test]
fn test_configure_cell_and_default_size() {
    setup();
    let config = CoordinatorConfig::default().with_default_row_height(48.0);
    let coordinator = coordinator_with_renderers(config);
    coordinator.add_section(Arc::new(SectionModel::new(vec![contact("Ada"), contact("Bob")])));

    let mut cell = ContactCell::default();
    coordinator
        .configure_cell(&mut cell, Address::new(0, 1))
        .unwrap();
    assert_eq!(cell.title, "Bob");
    assert_eq!(cell.row, Some(Address::new(0, 1)));
    assert_eq!(coordinator.size_for(Address::new(0, 1)).unwrap(), 48.0);

    let mut wrong = AdCell::default();
    let err = coordinator
        .configure_cell(&mut wrong, Address::new(0, 0))
        .unwrap_err();
    assert_eq!(
        err,
        Error::CellTypeMismatch {
            reuse_id: "contact".into(),
            expected: std::any::type_name::<ContactCell>(),
        }
    );
}

#[test]
fn test_rejected_batch_surfaces_inconsistent_script() {
    setup();
    let coordinator = coordinator_with_renderers(CoordinatorConfig::default());
    let section = Arc::new(SectionModel::new(vec![contact("Ada")]));
    coordinator.add_section(section.clone());

    let failures = Arc::new(Mutex::new(Vec::new()));
    let failures_clone = failures.clone();
    coordinator.batch_failed().connect(move |err: &Error| {
        failures_clone.lock().push(err.clone());
    });

    coordinator.host().reject.store(true, Ordering::SeqCst);
    section.push(contact("Grace"));

    assert_eq!(
        *failures.lock(),
        vec![Error::inconsistent(0, "host is mid-animation")]
    );
    assert!(coordinator.host().batches.lock().is_empty());

    // The host still shows one row, so a full reload is needed to recover.
    coordinator.host().reject.store(false, Ordering::SeqCst);
    coordinator.reload_data();
    section.push(contact("Linus"));
    assert_eq!(
        coordinator.host().last_batch().unwrap().to_string(),
        "[insert section 0, row 2]"
    );
    assert_eq!(failures.lock().len(), 1);
}

#[test]
fn test_unverified_batches_reach_host() {
    setup();
    let config = CoordinatorConfig::default().with_verify_batches(false);
    let coordinator = coordinator_with_renderers(config);
    coordinator.add_section(Arc::new(SectionModel::new(vec![contact("Ada")])));

    let script = rowsync::model::diff(&[1, 2, 3], &[3]);
    coordinator.on_edit_script(0, &script).unwrap();
    assert_eq!(
        coordinator.host().last_batch().unwrap().to_string(),
        "[delete section 0, row 0; delete section 0, row 1]"
    );

    let verifying = coordinator_with_renderers(CoordinatorConfig::default());
    verifying.add_section(Arc::new(SectionModel::new(vec![contact("Ada")])));
    assert!(matches!(
        verifying.on_edit_script(0, &script),
        Err(Error::InconsistentEditScript { section: 0, .. })
    ));
    assert!(matches!(
        verifying.on_edit_script(3, &script),
        Err(Error::InvalidAddress { .. })
    ));
}

#[derive(Default)]
struct RecordingOwner {
    selected: Mutex<Vec<(Address, String)>>,
    displayed: Mutex<Vec<Address>>,
}

impl CoordinatorOwner for RecordingOwner {
    fn row_selected(&self, address: Address, item: &AnyItem) {
        let name = item
            .downcast_ref::<Contact>()
            .map(|c| c.name.to_string())
            .unwrap_or_default();
        self.selected.lock().push((address, name));
    }

    fn will_display(&self, address: Address, cell: &mut dyn Any) {
        if let Some(cell) = cell.downcast_mut::<ContactCell>() {
            cell.title.push('!');
        }
        self.displayed.lock().push(address);
    }
}

#[test]
fn test_owner_receives_events_while_alive() {
    setup();
    let coordinator = coordinator_with_renderers(CoordinatorConfig::default());
    coordinator.add_section(Arc::new(SectionModel::new(vec![contact("Ada")])));

    // No owner is a normal state.
    assert!(!coordinator.has_owner());
    coordinator.did_select_row(Address::new(0, 0)).unwrap();

    let owner = Arc::new(RecordingOwner::default());
    coordinator.set_owner(&owner);
    assert!(coordinator.has_owner());

    coordinator.did_select_row(Address::new(0, 0)).unwrap();
    assert!(coordinator.did_select_row(Address::new(0, 4)).is_err());

    let mut cell = ContactCell::default();
    coordinator.configure_cell(&mut cell, Address::new(0, 0)).unwrap();
    coordinator.will_display(&mut cell, Address::new(0, 0));
    assert_eq!(cell.title, "Ada!");

    assert_eq!(
        *owner.selected.lock(),
        vec![(Address::new(0, 0), "Ada".to_string())]
    );
    assert_eq!(*owner.displayed.lock(), vec![Address::new(0, 0)]);

    drop(owner);
    assert!(!coordinator.has_owner());
    coordinator.did_select_row(Address::new(0, 0)).unwrap();
}

#[test]
fn test_mixed_section_diffs_and_dispatches() {
    setup();
    let coordinator = coordinator_with_renderers(CoordinatorConfig::default());
    let feed = Arc::new(SectionModel::new(vec![
        AnyItem::from_value(contact("Ada")),
        AnyItem::from_value(Ad { sponsor: "Acme" }),
    ]));
    coordinator.add_section(feed.clone());

    feed.replace(vec![
        AnyItem::from_value(contact("Ada")),
        AnyItem::from_value(contact("Grace")),
        AnyItem::from_value(Ad { sponsor: "Acme" }),
    ]);
    assert_eq!(
        coordinator.host().last_batch().unwrap().to_string(),
        "[insert section 0, row 1]"
    );

    assert_eq!(coordinator.reuse_id_for(Address::new(0, 1)).unwrap(), "contact");
    assert_eq!(coordinator.reuse_id_for(Address::new(0, 2)).unwrap(), "ad");

    let mut contact_cell = ContactCell::default();
    coordinator
        .configure_cell(&mut contact_cell, Address::new(0, 1))
        .unwrap();
    assert_eq!(contact_cell.title, "Grace");

    let mut ad_cell = AdCell::default();
    coordinator
        .configure_cell(&mut ad_cell, Address::new(0, 2))
        .unwrap();
    assert_eq!(ad_cell.banner, "Sponsored by Acme");

    assert_eq!(coordinator.size_for(Address::new(0, 0)).unwrap(), 30.0);
    assert_eq!(coordinator.size_for(Address::new(0, 2)).unwrap(), 120.0);

    // Same content rebuilt from fresh values: nothing to apply.
    let batches = coordinator.host().batches.lock().len();
    assert!(
        feed.replace(vec![
            AnyItem::from_value(contact("Ada")),
            AnyItem::from_value(contact("Grace")),
            AnyItem::from_value(Ad { sponsor: "Acme" }),
        ])
        .is_empty()
    );
    assert_eq!(coordinator.host().batches.lock().len(), batches);

    feed.replace(vec![
        AnyItem::from_value(contact("Ada")),
        AnyItem::from_value(Ad { sponsor: "Acme" }),
        AnyItem::from_value(42u32),
    ]);
    assert_eq!(
        coordinator.host().last_batch().unwrap().to_string(),
        "[delete section 0, row 1; insert section 0, row 2]"
    );
    assert_eq!(coordinator.row_count(0).unwrap(), 3);
    assert!(matches!(
        coordinator.reuse_id_for(Address::new(0, 2)),
        Err(Error::RendererNotFound { .. })
    ));
}
