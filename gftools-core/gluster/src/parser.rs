//! Gluster 命令输出解析
//!
//! - `gluster volume info --xml` 的 XML 输出
//! - `gluster volume set help` 的选项说明
//! - `getfattr -e hex` 读取的 stime 扩展属性

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use crate::error::{GlusterError, Result};
use crate::models::{GlusterVolume, OptionInfo, Stime, Transport, VolumeOption, VolumeStatus};

/// 简化的 XML 元素树
///
/// `text` 只保留第一个子元素之前的文本，与 gluster XML 中 `<brick>` 的混合内容对应
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlNode {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(start: &BytesStart<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Default::default()
        }
    }

    /// 按 `a/b/c` 路径查找第一个匹配的子孙元素
    pub fn find(&self, path: &str) -> Option<&XmlNode> {
        path.split('/').try_fold(self, |node, name| {
            node.children.iter().find(|c| c.name == name)
        })
    }

    /// 按 `a/b/c` 路径查找所有匹配的子孙元素（文档顺序）
    pub fn find_all<'a>(&'a self, path: &str) -> Vec<&'a XmlNode> {
        path.split('/').fold(vec![self], |nodes, name| {
            nodes
                .into_iter()
                .flat_map(|n| n.children.iter().filter(move |c| c.name == name))
                .collect()
        })
    }

    /// 子元素文本
    pub fn child_text(&self, path: &str) -> Option<&str> {
        self.find(path).map(|n| n.text.as_str())
    }
}

/// 将 XML 文本解析为元素树
pub(crate) fn parse_xml_tree(xml: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(XmlNode::new(&e)),
            Ok(Event::Empty(e)) => attach(&mut stack, &mut root, XmlNode::new(&e))?,
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| GlusterError::BadXmlFormat("多余的结束标签".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| GlusterError::BadXmlFormat(e.to_string()))?;
                push_text(&mut stack, &text);
            }
            Ok(Event::CData(e)) => {
                let data = e.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&data));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(GlusterError::BadXmlFormat(format!(
                    "位置 {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(GlusterError::BadXmlFormat(format!(
            "元素 <{}> 未闭合",
            open.name
        )));
    }

    root.ok_or_else(|| GlusterError::BadXmlFormat("XML 文档为空".to_string()))
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err(GlusterError::BadXmlFormat(format!(
            "存在多个根元素: <{}>",
            node.name
        )));
    }
    Ok(())
}

fn push_text(stack: &mut [XmlNode], text: &str) {
    if let Some(current) = stack.last_mut() {
        if current.children.is_empty() {
            current.text.push_str(text);
        }
    }
}

/// 解析 `gluster volume info --xml` 输出
///
/// # 输出格式示例
/// ```text
/// <cliOutput>
///   <opRet>0</opRet>
///   <volInfo>
///     <volumes>
///       <volume>
///         <name>gv0</name>
///         <id>6d93c9ff-6474-4806-bf22-bb023a199f4d</id>
///         <statusStr>Started</statusStr>
///         <brickCount>2</brickCount>
///         ...
///         <bricks><brick>node1:/data/brick1<name>node1:/data/brick1</name></brick></bricks>
///         <options><option><name>nfs.disable</name><value>on</value></option></options>
///       </volume>
///     </volumes>
///   </volInfo>
/// </cliOutput>
/// ```
pub fn parse_volume_info(xml: &str) -> Result<Vec<GlusterVolume>> {
    debug!("解析卷信息 XML: {} 字节", xml.len());

    let root = parse_xml_tree(xml)?;

    if root.name != "cliOutput" {
        return Err(GlusterError::BadXmlFormat(format!(
            "根元素应为 <cliOutput>, 实际为 <{}>",
            root.name
        )));
    }

    if let Some(op_ret) = root.child_text("opRet") {
        if op_ret.trim() != "0" {
            let message = root.child_text("opErrstr").unwrap_or_default();
            return Err(GlusterError::VolumeInfoFailed(message.to_string()));
        }
    }

    let volumes = root
        .find_all("volInfo/volumes/volume")
        .into_iter()
        .map(parse_volume)
        .collect::<Result<Vec<_>>>()?;

    debug!("解析完成: {} 个卷", volumes.len());
    Ok(volumes)
}

/// 从失败命令的 XML 输出中提取 opErrstr
pub fn extract_op_errstr(xml: &str) -> Option<String> {
    let root = parse_xml_tree(xml).ok()?;
    root.child_text("opErrstr")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_volume(node: &XmlNode) -> Result<GlusterVolume> {
    let name = required_text(node, "name")?.to_string();

    let bricks = node
        .find_all("bricks/brick")
        .into_iter()
        .map(|b| {
            // 新版本的 brick 还带有 <name> 子元素
            let text = b.text.trim();
            if text.is_empty() {
                b.child_text("name").unwrap_or_default().trim().to_string()
            } else {
                text.to_string()
            }
        })
        .collect();

    let options = node
        .find_all("options/option")
        .into_iter()
        .map(|o| -> Result<VolumeOption> {
            Ok(VolumeOption::new(
                required_text(o, "name")?,
                o.child_text("value").unwrap_or_default(),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GlusterVolume {
        uuid: required_text(node, "id")?.to_string(),
        volume_type: GlusterVolume::normalize_type(required_text(node, "typeStr")?),
        status: VolumeStatus::from_status_str(required_text(node, "statusStr")?),
        num_bricks: required_count(node, "brickCount")?,
        distribute: required_count(node, "distCount")?,
        stripe: required_count(node, "stripeCount")?,
        replica: required_count(node, "replicaCount")?,
        transport: Transport::from_code(required_text(node, "transport")?),
        bricks,
        options,
        name,
    })
}

fn required_text<'a>(node: &'a XmlNode, tag: &str) -> Result<&'a str> {
    node.child_text(tag)
        .ok_or_else(|| GlusterError::BadXmlFormat(format!("<{}> 缺少元素 <{}>", node.name, tag)))
}

fn required_count(node: &XmlNode, tag: &str) -> Result<u32> {
    let text = required_text(node, tag)?;
    text.trim().parse().map_err(|_| {
        GlusterError::BadXmlFormat(format!("元素 <{}> 的值 {:?} 不是整数", tag, text))
    })
}

/// 解析 `gluster volume set help` 输出
///
/// # 输出格式示例
/// ```text
/// Option: cluster.lookup-unhashed
/// Default Value: on
/// Description: This option if set to ON, does a lookup through all the sub-volumes
/// ```
pub fn parse_default_options(output: &str) -> Vec<OptionInfo> {
    let mut options: Vec<OptionInfo> = Vec::new();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "Option" => options.push(OptionInfo {
                name: value.to_string(),
                value: String::new(),
                description: String::new(),
            }),
            "Default Value" => {
                if let Some(current) = options.last_mut() {
                    current.value = value.to_string();
                }
            }
            "Description" => {
                if let Some(current) = options.last_mut() {
                    current.description = value.to_string();
                }
            }
            _ => {}
        }
    }

    debug!("解析到 {} 个默认选项", options.len());
    options
}

/// 用卷上设置的值覆盖默认值，未知选项追加在末尾（说明为空）
pub fn merge_volume_options(mut defaults: Vec<OptionInfo>, volume: &GlusterVolume) -> Vec<OptionInfo> {
    for opt in &volume.options {
        match defaults.iter_mut().find(|d| d.name == opt.name) {
            Some(existing) => existing.value = opt.value.clone(),
            None => defaults.push(OptionInfo {
                name: opt.name.clone(),
                value: opt.value.clone(),
                description: String::new(),
            }),
        }
    }
    defaults
}

/// 异地复制 stime 扩展属性名
pub fn stime_xattr_key(master_uuid: &str, slave_uuid: &str) -> String {
    format!("trusted.glusterfs.{}.{}.stime", master_uuid, slave_uuid)
}

/// 解析 `getfattr -n <key> -e hex` 输出中的 stime
///
/// # 输出格式示例
/// ```text
/// # file: /mnt/gvm
/// trusted.glusterfs.<master>.<slave>.stime=0x53ce39e500000000
/// ```
///
/// 值为两个大端 u32：秒和纳秒
pub fn parse_stime(output: &str, key: &str) -> Result<Stime> {
    let prefix = format!("{}=", key);

    let value = output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .ok_or_else(|| GlusterError::StimeUnavailable(format!("输出中没有 {}", key)))?;

    let hex = value
        .trim()
        .strip_prefix("0x")
        .ok_or_else(|| GlusterError::StimeUnavailable(format!("stime 不是十六进制值: {}", value)))?;

    if hex.len() != 16 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GlusterError::StimeUnavailable(format!(
            "stime 长度应为 8 字节: {}",
            value
        )));
    }

    let parse = |part: &str| {
        u32::from_str_radix(part, 16)
            .map_err(|e| GlusterError::StimeUnavailable(format!("stime 解析失败: {}", e)))
    };

    let (secs, nsecs) = (parse(&hex[..8])?, parse(&hex[8..])?);
    if nsecs >= 1_000_000_000 {
        return Err(GlusterError::StimeUnavailable(format!("stime 纳秒超出范围: {}", value)));
    }

    Ok(Stime::new(secs, nsecs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::STIME_UNAVAILABLE_MSG;

    const VOLUME_INFO_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cliOutput>
  <opRet>0</opRet>
  <opErrno>0</opErrno>
  <opErrstr/>
  <volInfo>
    <volumes>
      <volume>
        <name>gv0</name>
        <id>6d93c9ff-6474-4806-bf22-bb023a199f4d</id>
        <status>1</status>
        <statusStr>Started</statusStr>
        <brickCount>4</brickCount>
        <distCount>2</distCount>
        <stripeCount>1</stripeCount>
        <replicaCount>2</replicaCount>
        <type>7</type>
        <typeStr>Distributed-Replicate</typeStr>
        <transport>0</transport>
        <bricks>
          <brick uuid="a1">node1:/data/brick1<name>node1:/data/brick1</name><hostUuid>a1</hostUuid></brick>
          <brick uuid="a2">node2:/data/brick1<name>node2:/data/brick1</name><hostUuid>a2</hostUuid></brick>
          <brick uuid="a1">node1:/data/brick2<name>node1:/data/brick2</name><hostUuid>a1</hostUuid></brick>
          <brick uuid="a2">node2:/data/brick2<name>node2:/data/brick2</name><hostUuid>a2</hostUuid></brick>
        </bricks>
        <optCount>2</optCount>
        <options>
          <option>
            <name>nfs.disable</name>
            <value>on</value>
          </option>
          <option>
            <name>auth.allow</name>
            <value>10.0.0.*</value>
          </option>
        </options>
      </volume>
      <volume>
        <name>archive</name>
        <id>ef94e665-04f6-45a1-af47-a2fc94b238fb</id>
        <status>2</status>
        <statusStr>Stopped</statusStr>
        <brickCount>1</brickCount>
        <distCount>1</distCount>
        <stripeCount>1</stripeCount>
        <replicaCount>1</replicaCount>
        <type>0</type>
        <typeStr>Distribute</typeStr>
        <transport>2</transport>
        <bricks>
          <brick>node3:/export/archive</brick>
        </bricks>
        <optCount>0</optCount>
        <options/>
      </volume>
      <count>2</count>
    </volumes>
  </volInfo>
</cliOutput>"#;

    #[test]
    fn test_parse_volume_info() {
        let volumes = parse_volume_info(VOLUME_INFO_XML).unwrap();
        assert_eq!(volumes.len(), 2);

        let gv0 = &volumes[0];
        assert_eq!(gv0.name, "gv0");
        assert_eq!(gv0.uuid, "6d93c9ff-6474-4806-bf22-bb023a199f4d");
        assert_eq!(gv0.volume_type, "DISTRIBUTED_REPLICATE");
        assert_eq!(gv0.status, VolumeStatus::Up);
        assert_eq!(gv0.num_bricks, 4);
        assert_eq!(gv0.distribute, 2);
        assert_eq!(gv0.stripe, 1);
        assert_eq!(gv0.replica, 2);
        assert_eq!(gv0.transport, Transport::Tcp);
        assert_eq!(
            gv0.bricks,
            vec![
                "node1:/data/brick1",
                "node2:/data/brick1",
                "node1:/data/brick2",
                "node2:/data/brick2"
            ]
        );
        assert_eq!(gv0.options.len(), 2);
        assert_eq!(gv0.option("auth.allow"), Some("10.0.0.*"));

        let archive = &volumes[1];
        assert_eq!(archive.status, VolumeStatus::Down);
        assert_eq!(archive.transport, Transport::TcpRdma);
        assert_eq!(archive.bricks, vec!["node3:/export/archive"]);
        assert!(archive.options.is_empty());
    }

    #[test]
    fn test_parse_volume_info_empty() {
        let xml = r#"<cliOutput><opRet>0</opRet><volInfo><volumes><count>0</count></volumes></volInfo></cliOutput>"#;
        assert!(parse_volume_info(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_volume_info_op_ret_failure() {
        let xml = r#"<cliOutput><opRet>-1</opRet><opErrno>30806</opErrno><opErrstr>Volume nope does not exist</opErrstr></cliOutput>"#;
        match parse_volume_info(xml) {
            Err(GlusterError::VolumeInfoFailed(msg)) => assert_eq!(msg, "Volume nope does not exist"),
            other => panic!("应返回 VolumeInfoFailed, 实际: {:?}", other),
        }
        assert_eq!(
            extract_op_errstr(xml),
            Some("Volume nope does not exist".to_string())
        );
    }

    #[test]
    fn test_parse_volume_info_malformed() {
        assert!(matches!(
            parse_volume_info("<cliOutput><volInfo></cliOutput>"),
            Err(GlusterError::BadXmlFormat(_))
        ));
        assert!(matches!(
            parse_volume_info(""),
            Err(GlusterError::BadXmlFormat(_))
        ));
        assert!(matches!(
            parse_volume_info("<volInfo/>"),
            Err(GlusterError::BadXmlFormat(_))
        ));
    }

    #[test]
    fn test_parse_volume_missing_element() {
        let xml = r#"<cliOutput><opRet>0</opRet><volInfo><volumes><volume><name>gv0</name></volume></volumes></volInfo></cliOutput>"#;
        match parse_volume_info(xml) {
            Err(GlusterError::BadXmlFormat(msg)) => assert!(msg.contains("<id>")),
            other => panic!("应返回 BadXmlFormat, 实际: {:?}", other),
        }
    }

    #[test]
    fn test_parse_volume_bad_count() {
        let xml = VOLUME_INFO_XML.replace("<brickCount>4</brickCount>", "<brickCount>four</brickCount>");
        assert!(matches!(
            parse_volume_info(&xml),
            Err(GlusterError::BadXmlFormat(_))
        ));
    }

    #[test]
    fn test_xml_tree_find_all() {
        let root = parse_xml_tree("<a><b><c>1</c><c>2</c></b><b><c>3</c></b></a>").unwrap();
        let texts: Vec<&str> = root.find_all("b/c").iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
        assert_eq!(root.child_text("b/c"), Some("1"));
        assert!(root.find("x/y").is_none());
    }

    #[test]
    fn test_xml_text_unescape() {
        let root = parse_xml_tree("<a><v>a &amp; b</v></a>").unwrap();
        assert_eq!(root.child_text("v"), Some("a & b"));
    }

    #[test]
    fn test_parse_default_options() {
        let output = r#"
Option: cluster.lookup-unhashed
Default Value: on
Description: This option if set to ON, does a lookup through all the sub-volumes

Option: nfs.disable
Default Value: off
Description: This option is used to start or stop the NFS server: for individual volumes.
"#;

        let options = parse_default_options(output);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].name, "cluster.lookup-unhashed");
        assert_eq!(options[0].value, "on");
        assert_eq!(options[1].name, "nfs.disable");
        assert_eq!(
            options[1].description,
            "This option is used to start or stop the NFS server: for individual volumes."
        );
    }

    #[test]
    fn test_merge_volume_options() {
        let defaults = parse_default_options(
            "Option: nfs.disable\nDefault Value: off\nDescription: NFS server\n",
        );
        let volumes = parse_volume_info(VOLUME_INFO_XML).unwrap();

        let merged = merge_volume_options(defaults, &volumes[0]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "nfs.disable");
        assert_eq!(merged[0].value, "on");
        assert_eq!(merged[0].description, "NFS server");
        assert_eq!(merged[1].name, "auth.allow");
        assert_eq!(merged[1].description, "");
    }

    #[test]
    fn test_parse_stime() {
        let key = stime_xattr_key("m-uuid", "s-uuid");
        assert_eq!(key, "trusted.glusterfs.m-uuid.s-uuid.stime");

        let output = format!("# file: /mnt/gvm\n{}=0x53ce39e50000000a\n", key);
        let stime = parse_stime(&output, &key).unwrap();
        assert_eq!(stime.secs, 0x53ce39e5);
        assert_eq!(stime.nsecs, 10);
    }

    #[test]
    fn test_parse_stime_missing() {
        let key = stime_xattr_key("m", "s");
        assert!(matches!(
            parse_stime("/mnt/gvm: trusted.glusterfs.m.s.stime: No such attribute", &key),
            Err(GlusterError::StimeUnavailable(_))
        ));
        assert!(matches!(
            parse_stime(&format!("{}=0x1234", key), &key),
            Err(GlusterError::StimeUnavailable(_))
        ));
    }

    #[test]
    fn test_parse_stime_nsecs_out_of_range() {
        let key = stime_xattr_key("m", "s");

        let err = parse_stime(&format!("{}=0x53ce39e5ffffffff", key), &key).unwrap_err();
        assert!(matches!(err, GlusterError::StimeUnavailable(_)));
        assert_eq!(err.to_string(), STIME_UNAVAILABLE_MSG);

        let stime = parse_stime(&format!("{}=0x53ce39e53b9ac9ff", key), &key).unwrap();
        assert_eq!(stime.nsecs, 999_999_999);
    }
}
