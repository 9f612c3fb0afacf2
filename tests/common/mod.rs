//! Shared fixtures: an in-memory product service, a notice recorder, and an
//! in-memory navigator.

use std::cell::RefCell;
use std::rc::Rc;

use opsdeck::clock::ManualTimeSource;
use opsdeck::config::StateConfig;
use opsdeck::controller::ProductController;
use opsdeck::core::{NewProduct, Product, ProductId};
use opsdeck::service::{
    ListOptions, Location, Navigator, Notice, ProductPage, ProductService, ServiceError,
};
use opsdeck::WallClock;

/// In-memory stand-in for the remote CRUD service.
///
/// `fail_next` injects one failure into whichever call comes next, which is
/// how the tests exercise rollback and retry paths.
pub struct MockService {
    products: RefCell<Vec<Product>>,
    next_id: RefCell<u32>,
    pub fail_next: RefCell<Option<ServiceError>>,
    pub list_calls: RefCell<usize>,
    pub last_list_options: RefCell<Option<ListOptions>>,
}

impl MockService {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            products: RefCell::new(Vec::new()),
            next_id: RefCell::new(0),
            fail_next: RefCell::new(None),
            list_calls: RefCell::new(0),
            last_list_options: RefCell::new(None),
        })
    }

    /// Seed the backing store directly, bypassing the controller.
    pub fn seed(&self, names: &[&str]) {
        for name in names {
            let id = self.mint_id();
            self.products.borrow_mut().push(server_product(&id, name));
        }
    }

    pub fn fail_next_with(&self, err: ServiceError) {
        *self.fail_next.borrow_mut() = Some(err);
    }

    pub fn stored(&self) -> Vec<Product> {
        self.products.borrow().clone()
    }

    fn mint_id(&self) -> ProductId {
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        ProductId::new(format!("srv-{}", *next)).unwrap()
    }

    fn take_failure(&self) -> Result<(), ServiceError> {
        match self.fail_next.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl ProductService for MockService {
    fn list(&self, options: &ListOptions) -> Result<ProductPage, ServiceError> {
        self.take_failure()?;
        *self.list_calls.borrow_mut() += 1;
        *self.last_list_options.borrow_mut() = Some(options.clone());

        let matching: Vec<Product> = self
            .products
            .borrow()
            .iter()
            .filter(|p| match &options.search {
                Some(needle) => p.name.to_lowercase().contains(&needle.to_lowercase()),
                None => true,
            })
            .cloned()
            .collect();

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect();
        Ok(ProductPage { items, total })
    }

    fn create(&self, payload: &NewProduct) -> Result<Product, ServiceError> {
        self.take_failure()?;
        let id = self.mint_id();
        let mut product = server_product(&id, &payload.name);
        product.description = payload.description.clone();
        product.category = payload.category.clone();
        product.vendor = payload.vendor.clone();
        product.assignee = payload.assignee.clone();
        product.stage = payload.stage.clone();
        product.priority = payload.priority;
        product.tags = payload.tags.clone();
        product.price = payload.price;
        product.quantity = payload.quantity;
        self.products.borrow_mut().push(product.clone());
        Ok(product)
    }

    fn update(
        &self,
        id: &ProductId,
        patch: &opsdeck::core::ProductPatch,
    ) -> Result<Product, ServiceError> {
        self.take_failure()?;
        let mut products = self.products.borrow_mut();
        let slot = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ServiceError::NotFound { id: id.clone() })?;
        *slot = slot.patched(patch);
        Ok(slot.clone())
    }

    fn delete(&self, id: &ProductId) -> Result<(), ServiceError> {
        self.take_failure()?;
        let mut products = self.products.borrow_mut();
        let before = products.len();
        products.retain(|p| &p.id != id);
        if products.len() == before {
            return Err(ServiceError::NotFound { id: id.clone() });
        }
        Ok(())
    }
}

fn server_product(id: &ProductId, name: &str) -> Product {
    Product {
        id: id.clone(),
        name: name.to_string(),
        description: None,
        category: vec![],
        vendor: None,
        assignee: None,
        stage: None,
        priority: None,
        tags: vec![],
        price: None,
        quantity: None,
        created_at: WallClock(0),
        updated_at: WallClock(0),
    }
}

/// Captures every notice for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: RefCell<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn titles(&self) -> Vec<String> {
        self.notices.borrow().iter().map(|n| n.title.clone()).collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.borrow().last().cloned()
    }
}

impl opsdeck::service::Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }
}

/// In-memory address bar.
pub struct MemoryNavigator {
    location: RefCell<Location>,
    pub navigations: RefCell<Vec<(String, bool)>>,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self {
            location: RefCell::new(Location {
                pathname: "/products".into(),
                search: String::new(),
            }),
            navigations: RefCell::new(Vec::new()),
        }
    }
}

impl Navigator for MemoryNavigator {
    fn current_location(&self) -> Location {
        self.location.borrow().clone()
    }

    fn navigate(&self, url: &str, replace: bool) {
        self.navigations.borrow_mut().push((url.to_string(), replace));
        let (pathname, search) = url.split_once('?').unwrap_or((url, ""));
        *self.location.borrow_mut() = Location {
            pathname: pathname.into(),
            search: search.into(),
        };
    }
}

/// A controller wired to the mock collaborators, plus handles to all of them.
pub struct Harness {
    pub controller: ProductController,
    pub service: Rc<MockService>,
    pub notifier: Rc<RecordingNotifier>,
    pub clock: ManualTimeSource,
}

pub fn harness() -> Harness {
    harness_with(StateConfig::default())
}

pub fn harness_with(config: StateConfig) -> Harness {
    let service = MockService::new();
    let notifier = RecordingNotifier::new();
    let clock = ManualTimeSource::new(1_000_000);
    let controller = ProductController::new(
        Rc::clone(&service) as Rc<dyn ProductService>,
        Rc::clone(&notifier) as Rc<dyn opsdeck::service::Notifier>,
        Rc::new(clock.clone()),
        &config,
    );
    Harness {
        controller,
        service,
        notifier,
        clock,
    }
}
