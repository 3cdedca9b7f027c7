// Raffle deployment - per-network configuration and deployment plans
//
// A plan is an ordered list of steps, each a batch of instructions sent in
// one transaction. Development networks get a fresh mock coordinator with a
// funded subscription; live networks reuse an existing coordinator.
use solana_program::{instruction::Instruction, pubkey::Pubkey};
use thiserror::Error;

use crate::{
    instruction::{add_consumer, create_subscription, fund_subscription, initialize_coordinator, initialize_raffle},
    state::RaffleConfig,
};

/// Networks where mocks are deployed instead of using a live coordinator
pub const DEVELOPMENT_CHAINS: [&str; 2] = ["localnet", "localhost"];

/// Flat mock fee per fulfillment (0.25 SOL)
pub const VRF_BASE_FEE: u64 = 250_000_000;
/// Mock lamports per unit of callback gas
pub const GAS_PRICE: u64 = 1;
/// Lamports deposited into a freshly created mock subscription (10 SOL)
pub const VRF_SUB_FUND_AMOUNT: u64 = 10_000_000_000;
/// Subscription id a fresh mock coordinator hands out first
pub const FIRST_SUBSCRIPTION_ID: u64 = 1;

/// 0.01 SOL
pub const ENTRANCE_FEE: u64 = 10_000_000;
pub const GAS_LANE: [u8; 32] = [
    0x79, 0xd3, 0xd8, 0x83, 0x2d, 0x90, 0x45, 0x92, 0xc0, 0xbf, 0x98, 0x18, 0xb6, 0x21, 0x52,
    0x2c, 0x98, 0x8b, 0xb8, 0xb0, 0xc0, 0x5c, 0xdc, 0x3b, 0x15, 0xae, 0xa1, 0xb6, 0xe8, 0xdb,
    0x0c, 0x15,
];
pub const CALLBACK_GAS_LIMIT: u32 = 500_000;
/// Seconds between draws
pub const INTERVAL: u64 = 30;

// Placeholder until a coordinator is deployed on devnet; no account exists
// at this key yet.
const DEVNET_COORDINATOR: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2c, 0xa8, 0xe0,
    0xc6, 0x43, 0xbd, 0xe4, 0xc2, 0xe0, 0x8a, 0xb1, 0xfa, 0x0d, 0xa3, 0x40, 0x1a, 0xda, 0xd7,
    0x73, 0x4d,
];
const DEVNET_SUBSCRIPTION_ID: u64 = 8388;

/// Raffle parameters for one network
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: &'static str,
    /// Live coordinator; `None` where a mock is deployed
    pub vrf_coordinator: Option<Pubkey>,
    pub entrance_fee: u64,
    pub gas_lane: [u8; 32],
    /// Live subscription; `None` where one is created on the mock
    pub subscription_id: Option<u64>,
    pub callback_gas_limit: u32,
    pub interval: u64,
}

impl NetworkConfig {
    /// Look up the configuration of a network by name
    pub fn for_network(network: &str) -> Option<Self> {
        match network {
            "localnet" | "localhost" => Some(Self {
                name: "localnet",
                vrf_coordinator: None,
                entrance_fee: ENTRANCE_FEE,
                gas_lane: GAS_LANE,
                subscription_id: None,
                callback_gas_limit: CALLBACK_GAS_LIMIT,
                interval: INTERVAL,
            }),
            "devnet" => Some(Self {
                name: "devnet",
                vrf_coordinator: Some(Pubkey::new_from_array(DEVNET_COORDINATOR)),
                entrance_fee: ENTRANCE_FEE,
                gas_lane: GAS_LANE,
                subscription_id: Some(DEVNET_SUBSCRIPTION_ID),
                callback_gas_limit: CALLBACK_GAS_LIMIT,
                interval: INTERVAL,
            }),
            _ => None,
        }
    }
}

pub fn is_development_chain(network: &str) -> bool {
    DEVELOPMENT_CHAINS.contains(&network)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("No network configuration for {0}")]
    UnknownNetwork(String),
    #[error("Network {0} has no VRF coordinator configured")]
    MissingCoordinator(&'static str),
    #[error("Network {0} has no VRF subscription configured")]
    MissingSubscription(&'static str),
    #[error("A mock coordinator account is required on development network {0}")]
    MissingMockCoordinator(&'static str),
}

/// One transaction of a deployment
#[derive(Clone, Debug, PartialEq)]
pub struct DeployStep {
    pub label: &'static str,
    pub instructions: Vec<Instruction>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeployPlan {
    pub network: &'static str,
    /// Constructor arguments the raffle is deployed with
    pub raffle_config: RaffleConfig,
    pub steps: Vec<DeployStep>,
}

impl DeployPlan {
    pub fn step(&self, label: &str) -> Option<&DeployStep> {
        self.steps.iter().find(|step| step.label == label)
    }
}

pub const STEP_DEPLOY_MOCKS: &str = "deploy mocks";
pub const STEP_FUND_SUBSCRIPTION: &str = "create and fund subscription";
pub const STEP_DEPLOY_RAFFLE: &str = "deploy raffle";
pub const STEP_ADD_CONSUMER: &str = "add consumer";

/// Plan the deployment of `raffle` on `network`.
///
/// On development chains `mock_coordinator` is the key of the coordinator
/// account to create, and the raffle draws from its first subscription.
pub fn plan_deployment(
    program_id: &Pubkey,
    network: &str,
    deployer: &Pubkey,
    raffle: &Pubkey,
    mock_coordinator: Option<&Pubkey>,
) -> Result<DeployPlan, DeployError> {
    let config = NetworkConfig::for_network(network)
        .ok_or_else(|| DeployError::UnknownNetwork(network.to_string()))?;
    let mut steps = Vec::new();

    let (vrf_coordinator, subscription_id) = if is_development_chain(network) {
        let coordinator =
            *mock_coordinator.ok_or(DeployError::MissingMockCoordinator(config.name))?;
        steps.push(DeployStep {
            label: STEP_DEPLOY_MOCKS,
            instructions: vec![initialize_coordinator(
                program_id,
                deployer,
                &coordinator,
                VRF_BASE_FEE,
                GAS_PRICE,
            )],
        });
        steps.push(DeployStep {
            label: STEP_FUND_SUBSCRIPTION,
            instructions: vec![
                create_subscription(program_id, deployer, &coordinator, FIRST_SUBSCRIPTION_ID),
                fund_subscription(
                    program_id,
                    deployer,
                    &coordinator,
                    FIRST_SUBSCRIPTION_ID,
                    VRF_SUB_FUND_AMOUNT,
                ),
            ],
        });
        (coordinator, FIRST_SUBSCRIPTION_ID)
    } else {
        (
            config
                .vrf_coordinator
                .ok_or(DeployError::MissingCoordinator(config.name))?,
            config
                .subscription_id
                .ok_or(DeployError::MissingSubscription(config.name))?,
        )
    };

    let raffle_config = RaffleConfig {
        vrf_coordinator,
        entrance_fee: config.entrance_fee,
        gas_lane: config.gas_lane,
        subscription_id,
        callback_gas_limit: config.callback_gas_limit,
        interval: config.interval,
    };
    steps.push(DeployStep {
        label: STEP_DEPLOY_RAFFLE,
        instructions: vec![initialize_raffle(program_id, deployer, raffle, &raffle_config)],
    });

    if is_development_chain(network) {
        steps.push(DeployStep {
            label: STEP_ADD_CONSUMER,
            instructions: vec![add_consumer(
                program_id,
                deployer,
                &vrf_coordinator,
                subscription_id,
                raffle,
            )],
        });
    }

    Ok(DeployPlan {
        network: config.name,
        raffle_config,
        steps,
    })
}
