//! Demo module catalog.
//!
//! Ids line up with the built-in industry registry, so a freshly seeded
//! database produces the curated recommendations out of the box.

use moduvisor_core::domain::catalog::{normalize_key_features, CatalogItem, ItemId};
use moduvisor_core::domain::profile::IndustryLabel;

use crate::connection::DbPool;
use crate::repositories::{RepositoryError, SqlCatalogRepository};

struct DemoModule {
    id: i64,
    name: &'static str,
    category: &'static str,
    description: &'static str,
    key_features: &'static str,
    benefits: &'static str,
}

const DEMO_MODULES: &[DemoModule] = &[
    DemoModule {
        id: 1,
        name: "Online Store Builder",
        category: "E-COMMERCE",
        description: "Launch a branded online shop with product pages, cart and checkout in an afternoon.",
        key_features: "Drag-and-drop storefront; Mobile checkout; Custom domain",
        benefits: "Sell around the clock without a developer.",
    },
    DemoModule {
        id: 2,
        name: "Product Catalog Manager",
        category: "E-COMMERCE",
        description: "Keep product photos, variants and prices in one place and publish them to every channel.",
        key_features: "Variants and bundles; Bulk price updates; Channel sync",
        benefits: "**One source of truth** for every product listing...",
    },
    DemoModule {
        id: 3,
        name: "QRIS Payment Gateway",
        category: "PAYMENTS",
        description: "Accept QRIS payments from every Indonesian bank app and e-wallet with a single printed or on-screen QR code.",
        key_features: "Static and dynamic QR; Next-day settlement; Works with all QRIS wallets",
        benefits: "Cut cash handling and speed up the queue at the counter.",
    },
    DemoModule {
        id: 4,
        name: "GoPay & OVO Wallet Checkout",
        category: "PAYMENTS",
        description: "Let customers pay with GoPay, OVO and ShopeePay directly inside your online ordering flow.",
        key_features: "One-tap wallet checkout; Refunds from the dashboard; Payment links",
        benefits: "Fewer abandoned orders from customers without cards.",
    },
    DemoModule {
        id: 5,
        name: "Card Payments Terminal",
        category: "PAYMENTS",
        description: "Take debit and credit card payments in store with a portable terminal that syncs to your sales reports.",
        key_features: "Chip and contactless; Tips and split bills; Daily reconciliation",
        benefits: "Never turn away a customer who only carries a card.",
    },
    DemoModule {
        id: 6,
        name: "Online Table Reservations",
        category: "BOOKING",
        description: "Guests book tables from your website, Google or Instagram and get automatic reminders.",
        key_features: "Live table availability; Deposit collection; SMS and WhatsApp reminders",
        benefits: "Fill tables ahead of time and reduce no-shows.",
    },
    DemoModule {
        id: 7,
        name: "Appointment Scheduler",
        category: "BOOKING",
        description: "Clients pick a service, a staff member and a time slot online, day or night.",
        key_features: "Staff calendars; Buffer times; Automated reminders",
        benefits: "Stop playing phone tag to fill your calendar.",
    },
    DemoModule {
        id: 8,
        name: "Room Booking Engine",
        category: "BOOKING",
        description: "Commission-free direct booking for rooms and villas, embedded on your own website.",
        key_features: "Rate plans; Seasonal pricing; Instant confirmation",
        benefits: "Keep the margin you currently hand to booking platforms.",
    },
    DemoModule {
        id: 9,
        name: "Customer CRM",
        category: "CRM",
        description: "Every customer, conversation and purchase in one timeline so nobody falls through the cracks.",
        key_features: "Contact timeline; Tags and segments; Follow-up reminders",
        benefits: "Know your best customers and keep them coming back.",
    },
    DemoModule {
        id: 10,
        name: "Lead Pipeline",
        category: "CRM",
        description: "Track prospects from first enquiry to signed deal on a visual pipeline board.",
        key_features: "Kanban stages; Deal values; Win/loss reasons",
        benefits: "See exactly which deals need attention this week.",
    },
    DemoModule {
        id: 11,
        name: "WhatsApp Business Inbox",
        category: "COMMUNICATION",
        description: "A shared WhatsApp inbox for your whole team with quick replies and assignment.",
        key_features: "Shared inbox; Quick replies; Chat assignment",
        benefits: "Answer customers faster on the app they already use.",
    },
    DemoModule {
        id: 12,
        name: "Email Campaigns",
        category: "MARKETING",
        description: "Design and send newsletters and promotions to segmented customer lists.",
        key_features: "Templates; Segmentation; Open and click tracking",
        benefits: "Bring past customers back with a few clicks.",
    },
    DemoModule {
        id: 13,
        name: "Social Media Scheduler",
        category: "MARKETING",
        description: "Plan and schedule Instagram, Facebook and TikTok posts from a single calendar.",
        key_features: "Content calendar; Best-time posting; Post analytics",
        benefits: "Stay visible on social media without daily effort.",
    },
    DemoModule {
        id: 14,
        name: "Loyalty Points Program",
        category: "LOYALTY",
        description: "Reward repeat visits with points customers collect on every purchase and redeem for perks.",
        key_features: "Points per purchase; Reward tiers; Birthday rewards",
        benefits: "Turn one-time visitors into regulars.",
    },
    DemoModule {
        id: 15,
        name: "Gift Cards & Vouchers",
        category: "LOYALTY",
        description: "Sell digital gift cards and discount vouchers online and redeem them at the till.",
        key_features: "Digital gift cards; Promo codes; Balance tracking",
        benefits: "Bring in cash up front and new customers as gifts.",
    },
    DemoModule {
        id: 16,
        name: "QR Menu & Table Ordering",
        category: "ORDERING",
        description: "Guests scan a QR code at the table to browse the menu, order and pay without waiting for staff.",
        key_features: "Digital menu with photos; Order straight to kitchen; Pay at table",
        benefits: "Serve more tables with the same staff, even at peak hours.",
    },
    DemoModule {
        id: 17,
        name: "Kitchen Display System",
        category: "ORDERING",
        description: "Orders from every channel appear on a kitchen screen with prep timers and bump buttons.",
        key_features: "Multi-station routing; Prep timers; Order status updates",
        benefits: "Fewer lost tickets and faster, more consistent service.",
    },
    DemoModule {
        id: 18,
        name: "Delivery Dispatch",
        category: "DELIVERY",
        description: "Assign delivery orders to your own riders or third-party couriers from one dispatch board.",
        key_features: "Auto-assignment; Courier integrations; Delivery zones and fees",
        benefits: "Get food and parcels out the door faster.",
    },
    DemoModule {
        id: 19,
        name: "Driver Tracking App",
        category: "DELIVERY",
        description: "Riders get a mobile app with routes and proof of delivery; customers get a live tracking link.",
        key_features: "Live GPS tracking; Proof of delivery photos; Customer ETA links",
        benefits: "Fewer \"where is my order\" calls.",
    },
    DemoModule {
        id: 20,
        name: "Route Optimizer",
        category: "FLEET",
        description: "Plan the fastest multi-stop routes for your vehicles, accounting for traffic and time windows.",
        key_features: "Multi-stop planning; Time windows; Vehicle capacity",
        benefits: "Save fuel and fit more stops into every shift.",
    },
    DemoModule {
        id: 21,
        name: "Inventory Tracker",
        category: "INVENTORY",
        description: "Real-time stock levels across locations with low-stock alerts and stock-take tools.",
        key_features: "Multi-location stock; Low-stock alerts; Barcode scanning",
        benefits: "Never run out of your best sellers.",
    },
    DemoModule {
        id: 22,
        name: "Supplier Purchase Orders",
        category: "INVENTORY",
        description: "Create, send and receive purchase orders to suppliers and update stock automatically.",
        key_features: "PO templates; Partial receiving; Supplier price lists",
        benefits: "Reorder in minutes instead of hours.",
    },
    DemoModule {
        id: 23,
        name: "Sales Analytics Dashboard",
        category: "ANALYTICS",
        description: "See revenue, best sellers and busiest hours across every channel on one dashboard.",
        key_features: "Daily revenue; Product performance; Peak hour heatmap",
        benefits: "Make decisions from numbers, not guesses.",
    },
    DemoModule {
        id: 24,
        name: "Review Management",
        category: "MARKETING",
        description: "Collect and respond to Google and TripAdvisor reviews from one place and ask happy customers for more.",
        key_features: "Review requests; Reply from one inbox; Rating trends",
        benefits: "Climb local search results with more five-star reviews.",
    },
    DemoModule {
        id: 25,
        name: "Membership Subscriptions",
        category: "SUBSCRIPTIONS",
        description: "Sell monthly memberships and class packs with automatic recurring billing.",
        key_features: "Recurring billing; Freeze and cancel flows; Class packs",
        benefits: "Predictable monthly revenue.",
    },
    DemoModule {
        id: 26,
        name: "Class Timetable",
        category: "BOOKING",
        description: "Publish group classes with capacity limits, waitlists and online booking.",
        key_features: "Capacity limits; Waitlists; Instructor schedules",
        benefits: "Full classes without spreadsheet juggling.",
    },
    DemoModule {
        id: 27,
        name: "Patient Records",
        category: "RECORDS",
        description: "Secure patient files with visit notes, history and attachments.",
        key_features: "Visit notes; Medical history; Secure attachments",
        benefits: "Find any patient's history in seconds.",
    },
    DemoModule {
        id: 28,
        name: "Telemedicine Video Visits",
        category: "COMMUNICATION",
        description: "Run consultations over secure video calls booked straight from your schedule.",
        key_features: "Secure video; In-call notes; Online payment before visit",
        benefits: "See patients who cannot come to the clinic.",
    },
    DemoModule {
        id: 29,
        name: "Course Builder",
        category: "EDUCATION",
        description: "Create online courses with lessons, quizzes and certificates.",
        key_features: "Video lessons; Quizzes; Completion certificates",
        benefits: "Teach more students without more classroom hours.",
    },
    DemoModule {
        id: 30,
        name: "Student Enrollment",
        category: "CRM",
        description: "Manage applications, enrollments and parent contacts in one student database.",
        key_features: "Online applications; Enrollment status; Parent contacts",
        benefits: "Less paperwork every new term.",
    },
    DemoModule {
        id: 31,
        name: "Service Job Cards",
        category: "OPERATIONS",
        description: "Track every repair or service job from intake to pickup with digital job cards.",
        key_features: "Digital job cards; Parts used; Status updates to customers",
        benefits: "Know where every job stands at a glance.",
    },
    DemoModule {
        id: 32,
        name: "Property Listings Portal",
        category: "LISTINGS",
        description: "Publish property listings with photos, floor plans and enquiry forms.",
        key_features: "Listing pages; Enquiry capture; Portal syndication",
        benefits: "More qualified enquiries per listing.",
    },
    DemoModule {
        id: 33,
        name: "Virtual Tours",
        category: "LISTINGS",
        description: "Embed 360-degree virtual tours in listings so buyers can walk through remotely.",
        key_features: "360 photo tours; Floor plan hotspots; Shareable links",
        benefits: "Fewer wasted viewings.",
    },
    DemoModule {
        id: 34,
        name: "Contract E-Signature",
        category: "DOCUMENTS",
        description: "Send contracts for legally binding electronic signature and track who has signed.",
        key_features: "Signature workflows; Templates; Audit trail",
        benefits: "Close agreements in hours instead of days.",
    },
    DemoModule {
        id: 35,
        name: "Case & Matter Manager",
        category: "DOCUMENTS",
        description: "Organize matters, deadlines, documents and client communication per case.",
        key_features: "Matter files; Deadline reminders; Document versioning",
        benefits: "Never miss a filing deadline.",
    },
    DemoModule {
        id: 36,
        name: "Time Tracking & Billing",
        category: "INVOICING",
        description: "Log billable hours per client and project and turn them into invoices.",
        key_features: "Timers; Billable rates; Invoice from timesheets",
        benefits: "Bill every hour you work.",
    },
    DemoModule {
        id: 37,
        name: "Invoicing & Quotes",
        category: "INVOICING",
        description: "Send professional quotes and invoices, accept online payment and chase overdue ones automatically.",
        key_features: "Quote to invoice; Online payment links; Overdue reminders",
        benefits: "Get paid faster with less admin.",
    },
    DemoModule {
        id: 38,
        name: "Event Ticketing",
        category: "EVENTS",
        description: "Sell tickets for events and workshops with seat tiers and promo codes.",
        key_features: "Ticket tiers; Promo codes; Mobile tickets",
        benefits: "Sell out events without a ticketing agency.",
    },
    DemoModule {
        id: 39,
        name: "Guest List & Check-in",
        category: "EVENTS",
        description: "Check guests in at the door by scanning tickets on any phone.",
        key_features: "QR ticket scanning; Live attendance; Offline mode",
        benefits: "Short lines at the door.",
    },
    DemoModule {
        id: 40,
        name: "Staff Shift Planner",
        category: "HR",
        description: "Build staff rotas, share them on mobile and track hours worked.",
        key_features: "Drag-and-drop rota; Shift swaps; Timesheets",
        benefits: "Right number of people on every shift.",
    },
    DemoModule {
        id: 41,
        name: "Tour Package Builder",
        category: "BOOKING",
        description: "Package tours, transfers and activities into bookable itineraries with online payment.",
        key_features: "Itinerary builder; Seasonal pricing; Online deposits",
        benefits: "Sell complete trips, not just single activities.",
    },
    DemoModule {
        id: 42,
        name: "Multi-currency Payouts",
        category: "PAYMENTS",
        description: "Accept payments from international travellers in their currency and settle in rupiah.",
        key_features: "Multi-currency pricing; International cards; Rupiah settlement",
        benefits: "Make it easy for foreign guests to pay.",
    },
    DemoModule {
        id: 43,
        name: "Channel Manager",
        category: "BOOKING",
        description: "Sync room availability and rates across Booking.com, Agoda, Airbnb and your own site.",
        key_features: "Two-way OTA sync; Rate parity; Overbooking protection",
        benefits: "No more double bookings.",
    },
    DemoModule {
        id: 44,
        name: "Warehouse Management",
        category: "INVENTORY",
        description: "Bin locations, pick lists and packing workflows for warehouse teams.",
        key_features: "Bin locations; Pick and pack; Shipment labels",
        benefits: "Ship the right items faster.",
    },
];

impl From<&DemoModule> for CatalogItem {
    fn from(module: &DemoModule) -> Self {
        Self {
            id: ItemId(module.id),
            name: module.name.to_string(),
            description: module.description.to_string(),
            category: module.category.to_string(),
            key_features: normalize_key_features(module.key_features),
            benefits: module.benefits.to_string(),
        }
    }
}

pub fn demo_catalog() -> Vec<CatalogItem> {
    DEMO_MODULES.iter().map(CatalogItem::from).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub modules_seeded: usize,
    pub industries_seeded: usize,
}

/// Upserts the demo catalog and the industry list. Safe to run repeatedly.
pub async fn seed_demo_catalog(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
    let repository = SqlCatalogRepository::new(pool.clone());

    let modules = demo_catalog();
    for module in &modules {
        repository.upsert(module, true).await?;
    }

    for (position, label) in IndustryLabel::ALL.iter().enumerate() {
        let id = i64::try_from(position + 1).map_err(|e| RepositoryError::Decode(e.to_string()))?;
        repository.upsert_industry(id, *label).await?;
    }

    Ok(SeedResult { modules_seeded: modules.len(), industries_seeded: IndustryLabel::ALL.len() })
}
