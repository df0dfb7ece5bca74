// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Render command
//!
//! Reads the request, instance, grant request and grant snapshots as JSON
//! files and prints the stack fields for the operation as JSON.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use vnfm_core::application::stack_builder::StackBuilder;
use vnfm_core::application::userdata::UserDataRegistry;
use vnfm_core::domain::engine_config::EngineConfigManifest;
use vnfm_core::domain::grant::{Grant, GrantRequest};
use vnfm_core::domain::lcm_request::{LcmOperationType, LcmRequest};
use vnfm_core::domain::stack::StackFields;
use vnfm_core::domain::vnf_instance::VnfInstance;
use vnfm_core::infrastructure::vnfd_loader::CsarDirectoryRepository;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Lifecycle operation (INSTANTIATE, SCALE, HEAL, CHANGE_EXT_CONN, CHANGE_VNFPKG)
    #[arg(long)]
    pub operation: String,

    /// Lifecycle request body (JSON)
    #[arg(long, value_name = "FILE")]
    pub request: PathBuf,

    /// VNF instance snapshot (JSON)
    #[arg(long, value_name = "FILE")]
    pub instance: PathBuf,

    /// Grant request (JSON)
    #[arg(long, value_name = "FILE")]
    pub grant_request: PathBuf,

    /// Grant (JSON)
    #[arg(long, value_name = "FILE")]
    pub grant: PathBuf,

    /// Directory holding extracted packages (default: spec.csar_root)
    #[arg(long, value_name = "DIR")]
    pub csar_dir: Option<PathBuf>,

    /// Render the fields undoing the operation instead
    #[arg(long)]
    pub rollback: bool,
}

pub fn execute(args: RenderArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = EngineConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;

    let fields = render(&args, &config)?;
    let output = serde_json::to_string_pretty(&fields).context("Failed to serialize stack fields")?;
    println!("{}", output);

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} from {:?}", what, path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {} in {:?}", what, path))
}

fn render(args: &RenderArgs, config: &EngineConfigManifest) -> Result<StackFields> {
    let operation: LcmOperationType = args.operation.parse().map_err(|e: String| anyhow!(e))?;
    let body: Value = read_json(&args.request, "request")?;
    let request = LcmRequest::from_value(operation, body).context("Invalid lifecycle request")?;
    let inst: VnfInstance = read_json(&args.instance, "VNF instance")?;
    let grant_req: GrantRequest = read_json(&args.grant_request, "grant request")?;
    let grant: Grant = read_json(&args.grant, "grant")?;

    let csar_root = args
        .csar_dir
        .clone()
        .unwrap_or_else(|| config.spec.csar_root.clone());
    info!(operation = %operation, csar_root = ?csar_root, rollback = args.rollback, "Rendering");

    let builder = StackBuilder::new(
        Arc::new(UserDataRegistry::from_config(&config.spec)),
        Arc::new(CsarDirectoryRepository::new(csar_root)),
        config.spec.stack_create_timeout_mins,
    );

    let fields = if args.rollback {
        builder.make_rollback_fields(&request, &inst, &grant_req, &grant)
    } else {
        builder.make_fields(&request, &inst, &grant_req, &grant)
    };
    fields.with_context(|| format!("Failed to render {}", operation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const DEFINITIONS: &str = r#"
topology_template:
  substitution_mappings:
    properties:
      flavour_id: simple
  node_templates:
    VDU1:
      type: tosca.nodes.nfv.Vdu.Compute
      properties:
        sw_image_data:
          name: cirros-0.5.2
      capabilities:
        virtual_compute:
          properties:
            requested_additional_capabilities:
              properties:
                requested_additional_capability_name: m1.tiny
"#;

    const POOL_HOT: &str = r#"
heat_template_version: 2013-05-23
resources:
  VDU1:
    type: OS::Heat::AutoScalingGroup
    properties:
      desired_capacity: { get_param: [ nfv, VDU, VDU1, desired_capacity ] }
      resource:
        type: VDU1.yaml
        properties:
          flavor: { get_param: [ nfv, VDU, VDU1, computeFlavourId ] }
"#;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn args(tmp: &Path, operation: &str, request: Value) -> RenderArgs {
        let csar = tmp.join("csar");
        write(&csar, "vnfd-1/TOSCA-Metadata/TOSCA.meta", "TOSCA-Meta-File-Version: 1.0\n");
        write(&csar, "vnfd-1/Definitions/df.yaml", DEFINITIONS);
        write(&csar, "vnfd-1/BaseHOT/simple/top.yaml", POOL_HOT);

        RenderArgs {
            operation: operation.to_string(),
            request: write(tmp, "request.json", &request.to_string()),
            instance: write(tmp, "instance.json", r#"{"id": "inst-1", "vnfdId": "vnfd-1"}"#),
            grant_request: write(
                tmp,
                "grant_request.json",
                r#"{"vnfInstanceId": "inst-1", "vnfdId": "vnfd-1",
                    "addResources": [{"id": "r1", "type": "COMPUTE", "resourceTemplateId": "VDU1"}]}"#,
            ),
            grant: write(tmp, "grant.json", "{}"),
            csar_dir: Some(csar),
            rollback: false,
        }
    }

    #[test]
    fn test_render_instantiate() {
        let tmp = TempDir::new().unwrap();
        let args = args(tmp.path(), "instantiate", json!({"flavourId": "simple"}));

        let fields = render(&args, &EngineConfigManifest::default()).unwrap();
        assert_eq!(fields.stack_name.as_deref(), Some("vnf-inst-1"));
        assert_eq!(fields.timeout_mins, Some(60));
        assert_eq!(fields.nfv()["VDU"]["VDU1"]["desired_capacity"], json!(1));
        assert_eq!(fields.nfv()["VDU"]["VDU1"]["computeFlavourId"], json!("m1.tiny"));
    }

    #[test]
    fn test_render_rejects_bad_input() {
        let tmp = TempDir::new().unwrap();
        let mut args = args(tmp.path(), "terminate", json!({}));
        assert!(render(&args, &EngineConfigManifest::default()).is_err());

        args.operation = "instantiate".to_string();
        args.rollback = true;
        let err = render(&args, &EngineConfigManifest::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("no rollback"));

        args.rollback = false;
        fs::write(&args.grant, "not json").unwrap();
        assert!(render(&args, &EngineConfigManifest::default()).is_err());
    }
}
