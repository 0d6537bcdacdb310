use platform_api::ApiResult;
use platform_store::{EmployeeStore, NewEmployee, find_by_username};
use tracing::info;

struct DemoEmployee {
    username: &'static str,
    password: &'static str,
    name: &'static str,
    position: &'static str,
    address: &'static str,
    assignment: &'static str,
    bio: &'static str,
}

const DEMO_EMPLOYEES: [DemoEmployee; 3] = [
    DemoEmployee {
        username: "MercyB47",
        password: "cat123",
        name: "Mercy Brown",
        position: "Greenhouse Specialist",
        address: "12 Fern Lane",
        assignment: "Succulent Hydration Project",
        bio: "Mercy keeps the succulent house thriving and trains every new hire on watering schedules.",
    },
    DemoEmployee {
        username: "JohnS23",
        password: "pass456",
        name: "John Smith",
        position: "Landscape Designer",
        address: "48 Oak Avenue",
        assignment: "Orchid Rescue",
        bio: "John plans the seasonal displays and rescues orchids nobody else can save.",
    },
    DemoEmployee {
        username: "SarahJ88",
        password: "secure789",
        name: "Sarah Jones",
        position: "Nursery Manager",
        address: "7 Willow Court",
        assignment: "Spring Planting",
        bio: "Sarah runs the nursery floor and the weekend plant clinic.",
    },
];

/// Creates the demo employees whose usernames are not present yet. Returns
/// how many were created.
pub async fn seed_demo_employees(store: &dyn EmployeeStore) -> ApiResult<usize> {
    let existing = store.list_employees().await?;
    let mut created = 0;
    for demo in &DEMO_EMPLOYEES {
        if find_by_username(&existing, demo.username).is_some() {
            continue;
        }
        let record = store
            .create_employee(NewEmployee {
                full_name: demo.name.into(),
                position: demo.position.into(),
                address: demo.address.into(),
                current_assignment: demo.assignment.into(),
                onboarding_pending: false,
                bio: Some(demo.bio.into()),
                ..NewEmployee::stub(demo.username, demo.password)
            })
            .await?;
        info!(id = %record.id, username = demo.username, "demo employee created");
        created += 1;
    }
    Ok(created)
}
